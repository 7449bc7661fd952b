//! Fehlertypen fuer den Waechter

use std::path::PathBuf;

use thiserror::Error;

/// Fehler beim Umgang mit dem Wiederherstellungs-Log
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Wiederherstellungs-Log {pfad} nicht lesbar: {quelle}")]
    LogLesen {
        pfad: PathBuf,
        #[source]
        quelle: std::io::Error,
    },

    #[error("Wiederherstellungs-Log {pfad} nicht schreibbar: {quelle}")]
    LogSchreiben {
        pfad: PathBuf,
        #[source]
        quelle: std::io::Error,
    },

    #[error("Wiederherstellungs-Log ungueltig: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Ungueltiger Zeitstempel im Log: {0}")]
    Zeitstempel(i64),
}

impl GuardError {
    /// Die Datei war lesbar, ihr Inhalt aber unbrauchbar
    pub fn ist_inhaltsfehler(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Zeitstempel(_))
    }
}

/// Result-Alias fuer den Waechter
pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige_schreiben() {
        let e = GuardError::LogSchreiben {
            pfad: PathBuf::from("/ro/recover.json"),
            quelle: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nein"),
        };
        assert!(e.to_string().contains("/ro/recover.json"));
        assert!(e.to_string().contains("nicht schreibbar"));
    }

    #[test]
    fn json_fehler_konvertierung() {
        let json_err = serde_json::from_str::<u32>("kaputt").unwrap_err();
        let e: GuardError = json_err.into();
        assert!(e.to_string().starts_with("Wiederherstellungs-Log ungueltig"));
        assert!(e.ist_inhaltsfehler());
        assert!(GuardError::Zeitstempel(i64::MAX).ist_inhaltsfehler());
    }
}
