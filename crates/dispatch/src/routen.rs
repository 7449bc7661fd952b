//! Statische Routentabellen fuer Erweiterungen
//!
//! Eine Erweiterung beschreibt einmalig, welche Befehle und Ereignisse sie
//! behandelt. Der Dispatcher baut daraus bei der Registrierung die
//! Abonnements auf; zur Laufzeit wird nichts per Namen nachgeschlagen.

use std::borrow::Cow;

use crate::events::{Abonnement, Ereignis, EreignisArt};
use crate::kontext::Kontext;

/// Handler-Methode einer Erweiterung
pub type Methode<E> = fn(&mut E, &Ereignis, &mut Kontext<'_>) -> anyhow::Result<()>;

/// Zuordnung von Routing-Schluesseln zu Handler-Methoden
pub struct Routentabelle<E> {
    eintraege: Vec<(Abonnement, Methode<E>)>,
}

impl<E> Routentabelle<E> {
    pub fn neu() -> Self {
        Self {
            eintraege: Vec::new(),
        }
    }

    /// Behandelt den Befehl `token` (ohne Praefix)
    pub fn befehl(mut self, token: &'static str, methode: Methode<E>) -> Self {
        self.eintraege
            .push((Abonnement::Befehl(Cow::Borrowed(token)), methode));
        self
    }

    /// Behandelt alle Ereignisse der Art `art`
    pub fn ereignis(mut self, art: EreignisArt, methode: Methode<E>) -> Self {
        self.eintraege.push((Abonnement::Ereignis(art), methode));
        self
    }

    /// Behandelt faellige verzoegerte Aufrufe der Art `art`
    pub fn verzoegert(self, art: &'static str, methode: Methode<E>) -> Self {
        self.ereignis(EreignisArt::Verzoegert(Cow::Borrowed(art)), methode)
    }

    pub fn eintraege(&self) -> &[(Abonnement, Methode<E>)] {
        &self.eintraege
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}

impl<E> Default for Routentabelle<E> {
    fn default() -> Self {
        Self::neu()
    }
}

/// Erweiterung, die Befehle und Ereignisse behandelt
pub trait Erweiterung: 'static {
    /// Anzeigename fuer Logs und `!plugs`
    fn name(&self) -> &'static str;

    /// Routentabelle dieser Erweiterung
    fn routen() -> Routentabelle<Self>
    where
        Self: Sized;
}
