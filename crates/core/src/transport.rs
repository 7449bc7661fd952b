//! Transport-Schnittstelle
//!
//! Abstrahiert den Protokoll-Client (Verbindung, Zeilen-Framing, Kodierung).
//! Alle sendenden Methoden sind nicht-blockierend: sie reihen nur ein und
//! duerfen die Event-Schleife nie anhalten.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::event::{AusgehenderBefehl, TransportEreignis};

/// Protokoll-Client, von dem die Event-Schleife Ereignisse erhaelt
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Baut die Verbindung auf und liefert den Ereignis-Strom
    async fn verbinden(&mut self) -> Result<mpsc::Receiver<TransportEreignis>>;

    /// Raum betreten
    fn beitreten(&mut self, raum: &str) -> Result<()>;

    /// Rohe Protokollzeile senden
    fn roh_senden(&mut self, zeile: &str) -> Result<()>;

    /// Kick anfordern
    fn kick_anfordern(&mut self, raum: &str, name: &str, grund: &str) -> Result<()>;

    /// Modusaenderung anfordern
    fn modus_aendern(&mut self, raum: &str, modus: &str) -> Result<()>;

    /// Nachricht an Raum oder Teilnehmer
    fn nachricht_senden(&mut self, ziel: &str, text: &str) -> Result<()>;

    /// Verbindung mit Abschiedsnachricht beenden
    fn beenden(&mut self, nachricht: &str) -> Result<()>;

    /// Fuehrt einen ausgehenden Befehl ueber die passende Methode aus
    fn ausfuehren(&mut self, befehl: &AusgehenderBefehl) -> Result<()> {
        match befehl {
            AusgehenderBefehl::Beitreten { raum } => self.beitreten(raum),
            AusgehenderBefehl::Roh { zeile } => self.roh_senden(zeile),
            AusgehenderBefehl::Kick { raum, name, grund } => {
                self.kick_anfordern(raum, name, grund)
            }
            AusgehenderBefehl::Modus { raum, modus } => self.modus_aendern(raum, modus),
            AusgehenderBefehl::Nachricht { ziel, text } => self.nachricht_senden(ziel, text),
            AusgehenderBefehl::Beenden { nachricht } => self.beenden(nachricht),
        }
    }
}
