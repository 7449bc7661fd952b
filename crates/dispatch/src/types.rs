//! Gemeinsame Typen des Dispatchers

use std::time::Duration;

use crate::events::Ereignis;

/// Eindeutige ID einer Registrierung (Erweiterung oder einzelnes Abonnement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler:{}", self.0)
    }
}

/// Ergebnis einer Ausstrahlung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zustellung {
    /// Erfolgreich ausgefuehrte Handler
    pub aufgerufen: usize,
    /// Handler die einen Fehler lieferten oder abstuerzten
    pub fehlgeschlagen: usize,
}

impl Zustellung {
    /// Kein Handler war fuer den Schluessel registriert
    pub fn ist_leer(&self) -> bool {
        self.aufgerufen == 0 && self.fehlgeschlagen == 0
    }
}

/// Vorgemerkte verzoegerte Ausfuehrung
///
/// Die Event-Schleife entnimmt diese Eintraege nach jedem Ereignis und
/// stellt sie nach Ablauf von `verzoegerung` als [`Ereignis::Verzoegert`]
/// wieder in die Warteschlange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerzoegerterAufruf {
    pub verzoegerung: Duration,
    pub art: String,
    pub parameter: Vec<String>,
}

impl VerzoegerterAufruf {
    /// Wandelt den faelligen Aufruf in das zuzustellende Ereignis
    pub fn in_ereignis(self) -> Ereignis {
        Ereignis::Verzoegert {
            art: self.art,
            parameter: self.parameter,
        }
    }
}
