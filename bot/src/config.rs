//! Bot-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Bot ohne Konfigurationsdatei
//! lauffaehig ist (er betritt dann allerdings keinen Raum).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use shirk_auth::AuthKonfig;
use shirk_guard::WaechterKonfig;

/// Vollstaendige Bot-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Verbindung zum IRC-Server
    pub verbindung: VerbindungsEinstellungen,
    /// Befehlspraefix und Raeume
    pub bot: BotEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Berechtigungsstufen
    pub auth: AuthKonfig,
    /// Moderation
    pub waechter: WaechterKonfig,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Verbindungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    pub server: String,
    pub port: u16,
    /// TLS zum Server (Zertifikatspruefung gegen die webpki-Wurzeln)
    pub tls: bool,
    pub nickname: String,
    /// Server-Passwort (leer = kein PASS)
    pub passwort: Option<String>,
    pub realname: String,
    pub username: String,
    /// Wartezeit vor einem neuen Verbindungsversuch
    pub wiederverbindung_sek: u64,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            server: "irc.libera.chat".into(),
            port: 6667,
            tls: false,
            nickname: "shirk".into(),
            passwort: None,
            realname: "Fedmahn".into(),
            username: "shirk".into(),
            wiederverbindung_sek: 120,
        }
    }
}

/// Allgemeine Bot-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotEinstellungen {
    /// Praefix fuer Befehle, z.B. `!knockout`
    pub befehls_praefix: String,
    /// Raeume, die nach der Anmeldung betreten werden
    pub raeume: Vec<String>,
    /// Mindeststufe fuer `!quit`
    pub quit_stufe: u32,
}

impl Default for BotEinstellungen {
    fn default() -> Self {
        Self {
            befehls_praefix: "!".into(),
            raeume: Vec::new(),
            quit_stufe: 12,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    pub bind_adresse: String,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: false,
            bind_adresse: "127.0.0.1".into(),
            port: 9300,
        }
    }
}

impl BotConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// `server:port` fuer den Verbindungsaufbau
    pub fn server_adresse(&self) -> String {
        format!("{}:{}", self.verbindung.server, self.verbindung.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!(
            "{}:{}",
            self.observability.bind_adresse, self.observability.port
        )
    }

    pub fn wiederverbindung(&self) -> Duration {
        Duration::from_secs(self.verbindung.wiederverbindung_sek)
    }
}
