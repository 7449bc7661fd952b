//! shirk-guard – Moderation
//!
//! Der Waechter verteidigt Raeume gegen stoerende Teilnehmer:
//! Knockout ausloesen, Privileg anfordern, bannen, kicken und den Ban nach
//! Ablauf der Frist automatisch aufheben. Bestaetigte Bans ueberstehen
//! einen Neustart ueber das Wiederherstellungs-Log.
//!
//! # Architektur
//! - [`waechter::WaechterErweiterung`] – Zustandsautomat und Rejoin-Logik
//! - [`zustand`] – Schluessel- und Zustandstypen
//! - [`log::WiederherstellungsLog`] – Atomar geschriebenes JSON-Log
//! - [`config::WaechterKonfig`] – Stufen, Fristen, Privileg-Befehle

pub mod config;
pub mod error;
pub mod log;
pub mod waechter;
pub mod zustand;

// Bequeme Re-Exporte
pub use config::WaechterKonfig;
pub use error::{GuardError, Result};
pub use log::WiederherstellungsLog;
pub use waechter::{WaechterErweiterung, REJOIN, SCAN};
pub use zustand::{
    AusstehenderKnockout, ModerationsSchluessel, ModerationsZustand, RaumZustand,
    WiederherstellungsEintrag,
};
