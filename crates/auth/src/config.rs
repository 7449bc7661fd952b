//! Konfiguration der Berechtigungsstufen

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `[auth]`-Abschnitt der Bot-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthKonfig {
    /// Hostmaske (`user@host` oder nur `host`) -> Stufe
    pub hosts: HashMap<String, u32>,
    /// Services-Konto -> Stufe
    pub konten: HashMap<String, u32>,
    /// Nick-Praefixe, fuer die ein WHOIS angefordert wird
    pub bekannte_nicks: Vec<String>,
}

impl AuthKonfig {
    /// Stufe fuer eine Identitaet; der volle Eintrag hat Vorrang vor dem Host
    pub fn host_stufe(&self, identitaet: &str) -> Option<(u32, &str)> {
        if let Some((maske, stufe)) = self.hosts.get_key_value(identitaet) {
            return Some((*stufe, maske.as_str()));
        }
        let host = identitaet.rsplit_once('@').map(|(_, h)| h)?;
        self.hosts
            .get_key_value(host)
            .map(|(maske, stufe)| (*stufe, maske.as_str()))
    }

    /// Nick beginnt mit einem bekannten Praefix (ohne Gross-/Kleinschreibung)
    pub fn ist_bekannter_nick(&self, nick: &str) -> bool {
        let nick = nick.to_lowercase();
        self.bekannte_nicks
            .iter()
            .any(|p| nick.starts_with(&p.to_lowercase()))
    }
}
