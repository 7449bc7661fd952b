//! shirk-dispatch – Befehls- und Ereignis-Dispatch
//!
//! Erweiterungen registrieren sich mit einer statischen Routentabelle fuer
//! Befehle (`!token`) und Ereignisse. Der Dispatcher stellt jedes Ereignis
//! an alle Handler seines exakten Schluessels zu.
//!
//! # Architektur
//! - [`dispatcher::Dispatcher`] – Registrierung, Abonnements, Ausstrahlung
//! - [`routen::Erweiterung`] – Trait fuer Erweiterungen mit Routentabelle
//! - [`events::Ereignis`] – Alle zustellbaren Ereignisse
//! - [`kontext::Kontext`] – Zugriff der Handler auf Registry und Ausgang

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod kontext;
pub mod routen;
pub mod types;

// Bequeme Re-Exporte
pub use dispatcher::{Dispatcher, Handler};
pub use error::{DispatchError, Result};
pub use events::{Abonnement, Ereignis, EreignisArt};
pub use kontext::{ist_raum, Kontext};
pub use routen::{Erweiterung, Methode, Routentabelle};
pub use types::{HandlerId, VerzoegerterAufruf, Zustellung};
