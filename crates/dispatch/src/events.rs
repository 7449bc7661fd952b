//! Ereignis-System fuer Erweiterungen
//!
//! Definiert alle Ereignisse, die der Dispatcher verteilt, und den
//! Routing-Schluessel, unter dem Erweiterungen sie abonnieren.

use std::borrow::Cow;

use shirk_core::types::TeilnehmerId;

/// Art eines Ereignisses (exakter Routing-Schluessel)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EreignisArt {
    /// Bot wurde mit `<nick>: text` angesprochen
    Angesprochen,
    /// Private Nachricht an den Bot
    Privat,
    /// Nachricht in einem Raum
    Kanalnachricht,
    /// Teilnehmer (oder der Bot) ist einem Raum beigetreten
    Beigetreten,
    /// Teilnehmer hat einen Raum verlassen
    Verlassen,
    /// Teilnehmer hat den Server verlassen
    Beendet,
    /// Teilnehmer hat den Anzeigenamen geaendert
    Umbenannt,
    /// Der Bot wurde aus einem Raum geworfen
    GekicktAus,
    /// Modusaenderung in einem Raum
    Modus,
    /// Numerische Server-Antwort mit exaktem Code, z.B. `Roh(474)`
    Roh(u16),
    /// Presence-Registry hat einen Teilnehmer angelegt
    TeilnehmerErstellt,
    /// Presence-Registry hat einen Teilnehmer entfernt
    TeilnehmerEntfernt,
    /// Presence-Registry hat einen Teilnehmer umbenannt
    TeilnehmerUmbenannt,
    /// Faellige verzoegerte Ausfuehrung der angegebenen Art
    Verzoegert(Cow<'static, str>),
    /// Anmeldung am Server abgeschlossen
    Angemeldet,
}

impl std::fmt::Display for EreignisArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Roh(code) => write!(f, "roh:{code:03}"),
            Self::Verzoegert(art) => write!(f, "verzoegert:{art}"),
            andere => write!(f, "{andere:?}"),
        }
    }
}

/// Routing-Schluessel eines Abonnements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Abonnement {
    /// Befehl mit fuehrendem Token, ohne Praefix (`knockout`, nicht `!knockout`)
    Befehl(Cow<'static, str>),
    /// Protokoll- oder internes Ereignis
    Ereignis(EreignisArt),
}

impl std::fmt::Display for Abonnement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Befehl(token) => write!(f, "befehl:{token}"),
            Self::Ereignis(art) => write!(f, "{art}"),
        }
    }
}

/// Alle Ereignisse die der Dispatcher ausstrahlt
#[derive(Debug, Clone, PartialEq)]
pub enum Ereignis {
    /// `!token args...`; `argv[0]` ist das Token ohne Praefix
    Befehl {
        quelle: String,
        ziel: String,
        argv: Vec<String>,
    },
    Angesprochen {
        quelle: String,
        ziel: String,
        text: String,
    },
    Privat {
        quelle: String,
        text: String,
        ist_aktion: bool,
    },
    Kanalnachricht {
        quelle: String,
        raum: String,
        text: String,
        ist_aktion: bool,
    },
    Beigetreten { name: String, raum: String },
    Verlassen { name: String, raum: String },
    Beendet { name: String },
    Umbenannt { alt: String, neu: String },
    GekicktAus {
        raum: String,
        kicker: String,
        grund: String,
    },
    Modus {
        quelle: String,
        raum: String,
        hinzugefuegt: bool,
        modus: char,
        argumente: Vec<String>,
    },
    Roh { code: u16, parameter: Vec<String> },
    TeilnehmerErstellt { id: TeilnehmerId },
    TeilnehmerEntfernt { id: TeilnehmerId, name: String },
    TeilnehmerUmbenannt { id: TeilnehmerId, alt: String },
    Verzoegert { art: String, parameter: Vec<String> },
    Angemeldet,
}

impl Ereignis {
    /// Routing-Schluessel fuer dieses Ereignis
    pub fn schluessel(&self) -> Abonnement {
        let art = match self {
            Self::Befehl { argv, .. } => {
                let token = argv.first().cloned().unwrap_or_default();
                return Abonnement::Befehl(Cow::Owned(token));
            }
            Self::Angesprochen { .. } => EreignisArt::Angesprochen,
            Self::Privat { .. } => EreignisArt::Privat,
            Self::Kanalnachricht { .. } => EreignisArt::Kanalnachricht,
            Self::Beigetreten { .. } => EreignisArt::Beigetreten,
            Self::Verlassen { .. } => EreignisArt::Verlassen,
            Self::Beendet { .. } => EreignisArt::Beendet,
            Self::Umbenannt { .. } => EreignisArt::Umbenannt,
            Self::GekicktAus { .. } => EreignisArt::GekicktAus,
            Self::Modus { .. } => EreignisArt::Modus,
            Self::Roh { code, .. } => EreignisArt::Roh(*code),
            Self::TeilnehmerErstellt { .. } => EreignisArt::TeilnehmerErstellt,
            Self::TeilnehmerEntfernt { .. } => EreignisArt::TeilnehmerEntfernt,
            Self::TeilnehmerUmbenannt { .. } => EreignisArt::TeilnehmerUmbenannt,
            Self::Verzoegert { art, .. } => EreignisArt::Verzoegert(Cow::Owned(art.clone())),
            Self::Angemeldet => EreignisArt::Angemeldet,
        };
        Abonnement::Ereignis(art)
    }
}
