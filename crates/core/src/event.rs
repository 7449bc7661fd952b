//! Transport-Ereignisse und ausgehende Befehle
//!
//! Der Transport liefert typisierte Ereignisse in die Event-Schleife und
//! nimmt ausgehende Befehle entgegen. Die Syntax des Leitungsprotokolls
//! bleibt vollstaendig im Transport.

use serde::{Deserialize, Serialize};

/// Alle Ereignisse die der Transport an die Event-Schleife liefert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportEreignis {
    /// Anmeldung am Server abgeschlossen
    Angemeldet,
    /// Teilnehmer ist einem Raum beigetreten (auch der Bot selbst)
    Beigetreten {
        name: String,
        benutzer: String,
        host: String,
        raum: String,
    },
    /// Teilnehmer hat einen Raum verlassen
    Verlassen { name: String, raum: String },
    /// Teilnehmer wurde aus einem Raum entfernt
    Gekickt {
        raum: String,
        name: String,
        kicker: String,
        grund: String,
    },
    /// Teilnehmer hat den Server verlassen
    Beendet { name: String },
    /// Teilnehmer hat den Anzeigenamen geaendert
    Umbenannt { alt: String, neu: String },
    /// Ein einzelner Modus wurde gesetzt oder entfernt
    ModusGeaendert {
        quelle: String,
        raum: String,
        hinzugefuegt: bool,
        modus: char,
        argumente: Vec<String>,
    },
    /// Numerische Server-Antwort
    Numerisch { code: u16, parameter: Vec<String> },
    /// Nachricht an einen Raum oder an den Bot
    Nachricht {
        quelle: String,
        ziel: String,
        text: String,
        ist_aktion: bool,
    },
    /// Verbindung verloren
    Getrennt { grund: String },
}

/// Befehle die Erweiterungen an den Transport richten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AusgehenderBefehl {
    /// Raum betreten
    Beitreten { raum: String },
    /// Rohe Protokollzeile senden
    Roh { zeile: String },
    /// Teilnehmer aus einem Raum entfernen
    Kick {
        raum: String,
        name: String,
        grund: String,
    },
    /// Modusaenderung anfordern, z.B. `+b *!user@host`
    Modus { raum: String, modus: String },
    /// Nachricht an Raum oder Teilnehmer
    Nachricht { ziel: String, text: String },
    /// Bot herunterfahren
    Beenden { nachricht: String },
}

impl AusgehenderBefehl {
    /// Kurzer Name fuer Logs und Metriken
    pub fn art(&self) -> &'static str {
        match self {
            Self::Beitreten { .. } => "beitreten",
            Self::Roh { .. } => "roh",
            Self::Kick { .. } => "kick",
            Self::Modus { .. } => "modus",
            Self::Nachricht { .. } => "nachricht",
            Self::Beenden { .. } => "beenden",
        }
    }
}
