//! Fehlertypen fuer den Dispatcher

use thiserror::Error;

use crate::types::HandlerId;

/// Alle moeglichen Fehler im Dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Erweiterung wird bereits ausgefuehrt (reentranter Aufruf)
    #[error("Erweiterung '{0}' ist gerade beschaeftigt")]
    Beschaeftigt(&'static str),

    #[error("Handler nicht gefunden: {0}")]
    NichtGefunden(HandlerId),

    #[error("Handler '{name}' ist abgestuerzt: {meldung}")]
    Panik { name: String, meldung: String },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Result-Alias fuer den Dispatcher
pub type Result<T> = std::result::Result<T, DispatchError>;
