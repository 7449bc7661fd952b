//! shirk-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Shirk-Crates gemeinsam genutzt werden: Identitaets-Newtypes,
//! die typisierten Transport-Ereignisse und die `Transport`-Schnittstelle.

pub mod error;
pub mod event;
pub mod transport;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, ShirkError};
pub use event::{AusgehenderBefehl, TransportEreignis};
pub use transport::Transport;
pub use types::{Quelle, SekundaereIdentitaet, TeilnehmerId};
