//! Zustandstypen der Moderation
//!
//! Ein einziger Schluessel `(raum, identitaet)` bildet auf genau einen
//! Zustand ab. Ein Knockout und eine Wiederherstellung fuer denselben
//! Schluessel koennen dadurch nie gleichzeitig existieren.

use chrono::{DateTime, Utc};

use shirk_core::types::{SekundaereIdentitaet, TeilnehmerId};

/// Zusammengesetzter Schluessel eines Moderationsvorgangs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModerationsSchluessel {
    pub raum: String,
    pub identitaet: SekundaereIdentitaet,
}

impl ModerationsSchluessel {
    pub fn neu(raum: impl Into<String>, identitaet: SekundaereIdentitaet) -> Self {
        Self {
            raum: raum.into(),
            identitaet,
        }
    }
}

impl std::fmt::Display for ModerationsSchluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.raum, self.identitaet)
    }
}

/// Knockout, der auf das Privileg oder die Ban-Bestaetigung wartet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AusstehenderKnockout {
    pub dauer_sek: u64,
    pub nachricht: String,
    /// Anzeigename beim Ausloesen
    pub name: String,
    /// Stabile ID, um beim Kick den aktuellen Namen zu finden
    pub teilnehmer_id: Option<TeilnehmerId>,
    /// Gesendete, noch unbestaetigte Ban-Anfragen
    pub ban_versuche: u32,
}

/// Bestaetigter Ban mit Frist fuer die automatische Aufhebung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiederherstellungsEintrag {
    pub raum: String,
    pub identitaet: SekundaereIdentitaet,
    /// Anzeigename zum Zeitpunkt des Kicks
    pub name: String,
    pub frist: DateTime<Utc>,
    pub dauer_sek: u64,
    pub nachricht: String,
}

impl WiederherstellungsEintrag {
    pub fn schluessel(&self) -> ModerationsSchluessel {
        ModerationsSchluessel::neu(self.raum.clone(), self.identitaet.clone())
    }

    /// Frist erreicht oder ueberschritten
    pub fn ist_faellig(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt >= self.frist
    }
}

/// Zustand eines Schluessels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationsZustand {
    /// Ausgeloest, Ban noch nicht bestaetigt
    Ausstehend(AusstehenderKnockout),
    /// Gebannt und gekickt, wartet auf die Frist
    Gebannt(WiederherstellungsEintrag),
}

impl ModerationsZustand {
    pub fn ist_ausstehend(&self) -> bool {
        matches!(self, Self::Ausstehend(_))
    }

    pub fn als_eintrag(&self) -> Option<&WiederherstellungsEintrag> {
        match self {
            Self::Gebannt(e) => Some(e),
            Self::Ausstehend(_) => None,
        }
    }
}

/// Zustand eines Raums aus Sicht des Bots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaumZustand {
    /// Bot haelt das Moderations-Privileg
    pub hat_privileg: bool,
    /// Privileg angefordert, Antwort steht aus
    pub angefordert: bool,
    /// Bot ist im Raum
    pub beigetreten: bool,
    pub rejoin_versuche: u32,
}

/// Sekundengenaue Frist, damit sie das Log verlustfrei uebersteht
pub fn frist_berechnen(jetzt: DateTime<Utc>, dauer_sek: u64) -> DateTime<Utc> {
    let sek = jetzt.timestamp().saturating_add(dauer_sek.min(i64::MAX as u64) as i64);
    DateTime::from_timestamp(sek, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eintrag(frist: DateTime<Utc>) -> WiederherstellungsEintrag {
        WiederherstellungsEintrag {
            raum: "#chat".into(),
            identitaet: SekundaereIdentitaet::neu("alice@host"),
            name: "alice".into(),
            frist,
            dauer_sek: 20,
            nachricht: "tschuess".into(),
        }
    }

    #[test]
    fn faellig_ab_frist() {
        let frist = DateTime::from_timestamp(1_700_000_020, 0).unwrap();
        let e = eintrag(frist);
        assert!(!e.ist_faellig(frist - chrono::Duration::seconds(1)));
        assert!(e.ist_faellig(frist));
        assert!(e.ist_faellig(frist + chrono::Duration::seconds(1)));
    }

    #[test]
    fn frist_ist_sekundengenau() {
        let jetzt = DateTime::from_timestamp(1_700_000_000, 987_000_000).unwrap();
        let frist = frist_berechnen(jetzt, 20);
        assert_eq!(frist.timestamp(), 1_700_000_020);
        assert_eq!(frist.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn schluessel_anzeige() {
        let e = eintrag(Utc::now());
        assert_eq!(e.schluessel().to_string(), "#chat/alice@host");
    }

    #[test]
    fn zustand_zugriffe() {
        let z = ModerationsZustand::Gebannt(eintrag(Utc::now()));
        assert!(!z.ist_ausstehend());
        assert!(z.als_eintrag().is_some());
    }
}
