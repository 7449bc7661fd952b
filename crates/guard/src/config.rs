//! Konfiguration des Waechters
//!
//! Alle Zeitangaben in Sekunden.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[waechter]`-Abschnitt der Bot-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaechterKonfig {
    /// Ban-Dauer wenn `!knockout` keine angibt
    pub ban_dauer_sek: u64,
    /// Maximale Rejoin-Versuche pro Raum nach "banned from channel"
    pub max_rejoin_versuche: u32,
    /// Pause vor einem Rejoin-Versuch
    pub rejoin_pause_sek: u64,
    /// Intervall des Wiederherstellungs-Scans
    pub scan_intervall_sek: u64,
    /// Mindeststufe fuer `!knockout`; darunter loesen verbotene Befehle aus
    pub knockout_stufe: u32,
    /// Mindeststufe fuer `!rejoin`
    pub rejoin_stufe: u32,
    /// Unbestaetigte Ban-Anfragen, nach denen ein Knockout verworfen wird
    pub max_ban_versuche: u32,
    /// Befehle, deren Benutzung unterhalb von `knockout_stufe` einen Knockout ausloest
    pub verbotene_befehle: Vec<String>,
    /// Kick-Nachricht wenn keine angegeben wurde
    pub standard_nachricht: String,
    /// Pfad des Wiederherstellungs-Logs
    pub log_pfad: PathBuf,
    /// Rohzeile zum Anfordern des Raum-Privilegs; `{raum}` wird ersetzt
    pub privileg_anfordern: String,
    /// Rohzeile zum Abgeben des Raum-Privilegs; `{raum}` wird ersetzt
    pub privileg_abgeben: String,
}

impl Default for WaechterKonfig {
    fn default() -> Self {
        Self {
            ban_dauer_sek: 20,
            max_rejoin_versuche: 100,
            rejoin_pause_sek: 60,
            scan_intervall_sek: 60,
            knockout_stufe: 10,
            rejoin_stufe: 12,
            max_ban_versuche: 3,
            verbotene_befehle: vec!["register".into()],
            standard_nachricht: "Your behaviour is not appreciated here.".into(),
            log_pfad: PathBuf::from("recover.json"),
            privileg_anfordern: "CHANSERV OP {raum}".into(),
            privileg_abgeben: "CHANSERV DEOP {raum}".into(),
        }
    }
}

impl WaechterKonfig {
    pub fn rejoin_pause(&self) -> Duration {
        Duration::from_secs(self.rejoin_pause_sek)
    }

    pub fn scan_intervall(&self) -> Duration {
        Duration::from_secs(self.scan_intervall_sek)
    }

    pub fn anforderung_fuer(&self, raum: &str) -> String {
        self.privileg_anfordern.replace("{raum}", raum)
    }

    pub fn abgabe_fuer(&self, raum: &str) -> String {
        self.privileg_abgeben.replace("{raum}", raum)
    }
}
