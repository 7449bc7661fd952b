//! Gemeinsame Identifikationstypen fuer Shirk
//!
//! Newtypes verhindern Verwechslungen zwischen Anzeigename, stabiler
//! Teilnehmer-ID und der Moderations-Identitaet (`user@host`).

use serde::{Deserialize, Serialize};

/// Stabile Teilnehmer-ID
///
/// Wird einmalig beim ersten beobachteten Beitritt vergeben und nie
/// wiederverwendet. Ueberlebt Umbenennungen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeilnehmerId(pub u64);

impl TeilnehmerId {
    /// Gibt den inneren Zaehlerwert zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TeilnehmerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

/// Sekundaere Identitaet eines Teilnehmers: `benutzer@host`
///
/// Schluessel fuer alle Moderationsvorgaenge, da der Anzeigename
/// jederzeit geaendert werden kann.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SekundaereIdentitaet(String);

impl SekundaereIdentitaet {
    /// Bildet die Identitaet aus Protokoll-Benutzername und Host
    pub fn aus_benutzer_host(benutzer: &str, host: &str) -> Self {
        Self(format!("{benutzer}@{host}"))
    }

    /// Uebernimmt eine bereits zusammengesetzte `benutzer@host`-Zeichenkette
    pub fn neu(wert: impl Into<String>) -> Self {
        Self(wert.into())
    }

    /// Liest die Identitaet aus einer Banmaske der Form `*!benutzer@host`
    ///
    /// Gibt `None` zurueck wenn die Maske nicht von dieser Form ist.
    pub fn aus_banmaske(maske: &str) -> Option<Self> {
        let rest = maske.strip_prefix("*!")?;
        if rest.is_empty() || !rest.contains('@') {
            return None;
        }
        Some(Self(rest.to_string()))
    }

    /// Banmaske fuer diese Identitaet
    pub fn banmaske(&self) -> String {
        format!("*!{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SekundaereIdentitaet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absender-Praefix einer Protokollzeile: `nick!benutzer@host`
///
/// Server-Praefixe haben weder Benutzer noch Host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quelle {
    pub nick: String,
    pub benutzer: Option<String>,
    pub host: Option<String>,
}

impl Quelle {
    /// Zerlegt einen Praefix in seine Bestandteile
    pub fn parsen(praefix: &str) -> Self {
        let (nick, rest) = match praefix.split_once('!') {
            Some((nick, rest)) => (nick, Some(rest)),
            None => (praefix, None),
        };
        let (benutzer, host) = match rest.and_then(|r| r.split_once('@')) {
            Some((benutzer, host)) => (Some(benutzer.to_string()), Some(host.to_string())),
            None => (rest.map(str::to_string), None),
        };
        Self {
            nick: nick.to_string(),
            benutzer,
            host,
        }
    }

    /// Sekundaere Identitaet falls Benutzer und Host bekannt sind
    pub fn identitaet(&self) -> Option<SekundaereIdentitaet> {
        match (&self.benutzer, &self.host) {
            (Some(benutzer), Some(host)) => {
                Some(SekundaereIdentitaet::aus_benutzer_host(benutzer, host))
            }
            _ => None,
        }
    }
}
