//! shirk-presence – Presence-Registry
//!
//! Haelt alle sichtbaren Teilnehmer, damit Informationen (stabile ID,
//! Berechtigungsstufe) Umbenennungen ueberdauern. Authentifizierung findet
//! hier nicht statt; Erweiterungen duerfen aber Attribute wie die
//! Berechtigungsstufe am Teilnehmer setzen.

pub mod registry;

// Bequeme Re-Exporte
pub use registry::{
    BeitrittsErgebnis, PresenceRegistry, Teilnehmer, TeilnehmerRef, Umbenennung,
};
