//! Ausfuehrungskontext fuer Handler
//!
//! Jeder Handler erhaelt einen `Kontext` mit Zugriff auf den Dispatcher,
//! die Presence-Registry und den Ausgangspuffer. Handler senden nie direkt;
//! sie legen Befehle in den Puffer, den die Event-Schleife nach der
//! Ausstrahlung an den Transport uebergibt.

use std::time::Duration;

use chrono::{DateTime, Utc};
use shirk_core::event::AusgehenderBefehl;
use shirk_presence::PresenceRegistry;

use crate::dispatcher::Dispatcher;

/// Prueft ob ein Ziel ein Raumname ist
pub fn ist_raum(ziel: &str) -> bool {
    ziel.starts_with('#') || ziel.starts_with('&')
}

/// Kontext einer einzelnen Ausstrahlung
pub struct Kontext<'a> {
    pub dispatcher: &'a Dispatcher,
    pub presence: &'a mut PresenceRegistry,
    pub ausgang: &'a mut Vec<AusgehenderBefehl>,
    pub jetzt: DateTime<Utc>,
    pub eigener_nick: &'a str,
}

impl<'a> Kontext<'a> {
    pub fn neu(
        dispatcher: &'a Dispatcher,
        presence: &'a mut PresenceRegistry,
        ausgang: &'a mut Vec<AusgehenderBefehl>,
        jetzt: DateTime<Utc>,
        eigener_nick: &'a str,
    ) -> Self {
        Self {
            dispatcher,
            presence,
            ausgang,
            jetzt,
            eigener_nick,
        }
    }

    /// Reiht einen ausgehenden Befehl ein
    pub fn senden(&mut self, befehl: AusgehenderBefehl) {
        self.ausgang.push(befehl);
    }

    /// Antwortet im Raum, falls dort geschrieben wurde, sonst privat an die Quelle
    pub fn antworten(&mut self, quelle: &str, ziel: &str, text: impl Into<String>) {
        let ziel = if ist_raum(ziel) { ziel } else { quelle };
        self.senden(AusgehenderBefehl::Nachricht {
            ziel: ziel.to_string(),
            text: text.into(),
        });
    }

    /// Berechtigungsstufe eines Teilnehmers (0 wenn unbekannt)
    pub fn macht(&self, name: &str) -> u32 {
        self.presence
            .per_name(name)
            .map(|t| t.borrow().macht)
            .unwrap_or(0)
    }

    /// Vergleicht einen Namen mit dem eigenen Nick
    pub fn ist_selbst(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.eigener_nick)
    }

    /// Plant eine verzoegerte Ausfuehrung ueber den Dispatcher
    pub fn verzoegert_planen(
        &self,
        verzoegerung: Duration,
        art: impl Into<String>,
        parameter: Vec<String>,
    ) {
        self.dispatcher.verzoegert_planen(verzoegerung, art, parameter);
    }
}
