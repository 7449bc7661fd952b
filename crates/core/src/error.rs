//! Fehlertypen fuer Shirk
//!
//! Zentraler Fehler-Enum fuer Transport und Bootstrap. Die Fach-Crates
//! (presence, dispatch, guard) definieren eigene Fehler.

use thiserror::Error;

/// Globaler Result-Alias fuer Shirk
pub type Result<T> = std::result::Result<T, ShirkError>;

/// Fehler an der Transport- und Bootstrap-Grenze
#[derive(Debug, Error)]
pub enum ShirkError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- IO ---
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ShirkError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn ein erneuter Verbindungsversuch sinnvoll ist
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Verbindung(_) | Self::Getrennt(_) | Self::Io(_))
    }
}
