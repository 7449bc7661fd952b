//! shirk-auth – Berechtigungsstufen
//!
//! Dieses Crate implementiert:
//! - Stufen aus einer Hostmasken-Tabelle beim Anlegen eines Teilnehmers
//! - WHOIS-Abfrage fuer bekannte Nick-Praefixe und Auswertung von 330
//! - `!auth` (erneute Pruefung) und `!whoami` (Auskunft)

pub mod config;
pub mod erweiterung;

// Bequeme Re-Exporte
pub use config::AuthKonfig;
pub use erweiterung::AuthErweiterung;
