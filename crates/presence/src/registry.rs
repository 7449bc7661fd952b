//! Presence-Registry – Teilnehmer nach Anzeigename, stabiler ID und
//! sekundaerer Identitaet
//!
//! Genau ein Teilnehmer pro Anzeigename; Namen werden wie im IRC ohne
//! Beachtung der Gross-/Kleinschreibung (ASCII) verglichen. Teilen sich mehrere Teilnehmer eine
//! Identitaet, zeigt der Identitaets-Index auf den zuletzt beigetretenen. Die stabile ID wird beim ersten
//! beobachteten Beitritt vergeben und nie wiederverwendet; der Zaehler
//! gehoert der Registry-Instanz.
//!
//! Teilnehmer werden als `Rc<RefCell<_>>` herausgegeben. Beim Entfernen
//! wird zuerst `lebendig` auf `false` gesetzt, damit Erweiterungen, die
//! (unerlaubterweise) einen Handle behalten, die Ungueltigkeit sehen statt
//! auf einem Phantom zu arbeiten.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use shirk_core::types::{SekundaereIdentitaet, TeilnehmerId};

// ---------------------------------------------------------------------------
// Teilnehmer
// ---------------------------------------------------------------------------

/// Ein sichtbarer Teilnehmer
#[derive(Debug, Clone)]
pub struct Teilnehmer {
    pub id: TeilnehmerId,
    pub name: String,
    pub identitaet: SekundaereIdentitaet,
    /// Raeume, die der Bot mit diesem Teilnehmer teilt
    pub raeume: BTreeSet<String>,
    pub lebendig: bool,
    /// Berechtigungsstufe, wird von der Auth-Erweiterung gesetzt
    pub macht: u32,
    /// Womit die Stufe festgestellt wurde (z.B. "hostmask", "NickServ")
    pub auth_methode: Option<String>,
}

/// Geteilter Handle auf einen Teilnehmer
pub type TeilnehmerRef = Rc<RefCell<Teilnehmer>>;

/// Ergebnis von [`PresenceRegistry::beigetreten`]
#[derive(Debug, Clone)]
pub enum BeitrittsErgebnis {
    /// Neuer Teilnehmer angelegt
    Erstellt(TeilnehmerRef),
    /// Bekannter Teilnehmer, Raum hinzugefuegt
    RaumHinzugefuegt(TeilnehmerRef),
}

impl BeitrittsErgebnis {
    pub fn teilnehmer(&self) -> &TeilnehmerRef {
        match self {
            Self::Erstellt(t) | Self::RaumHinzugefuegt(t) => t,
        }
    }
}

/// Ergebnis von [`PresenceRegistry::umbenannt`]
#[derive(Debug, Clone)]
pub struct Umbenennung {
    pub teilnehmer: TeilnehmerRef,
    /// Teilnehmer, der den neuen Namen vorher trug und ueberschrieben wurde
    pub verdraengt: Option<TeilnehmerRef>,
}

// ---------------------------------------------------------------------------
// PresenceRegistry
// ---------------------------------------------------------------------------

/// Verwaltet alle sichtbaren Teilnehmer
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    per_name: HashMap<String, TeilnehmerRef>,
    per_id: HashMap<TeilnehmerId, TeilnehmerRef>,
    per_identitaet: HashMap<SekundaereIdentitaet, TeilnehmerRef>,
    letzte_id: u64,
}

impl PresenceRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Teilnehmer ist einem Raum beigetreten
    ///
    /// Legt einen neuen Teilnehmer an oder fuegt den Raum einem bekannten
    /// hinzu. Die Identitaet eines bekannten Teilnehmers bleibt unveraendert.
    pub fn beigetreten(
        &mut self,
        name: &str,
        identitaet: SekundaereIdentitaet,
        raum: &str,
    ) -> BeitrittsErgebnis {
        if let Some(teilnehmer) = self.per_name.get(&name_schluessel(name)) {
            teilnehmer.borrow_mut().raeume.insert(raum.to_string());
            tracing::debug!(name, raum, "Raum zu Teilnehmer hinzugefuegt");
            return BeitrittsErgebnis::RaumHinzugefuegt(Rc::clone(teilnehmer));
        }

        self.letzte_id += 1;
        let id = TeilnehmerId(self.letzte_id);
        let teilnehmer = Rc::new(RefCell::new(Teilnehmer {
            id,
            name: name.to_string(),
            identitaet: identitaet.clone(),
            raeume: BTreeSet::from([raum.to_string()]),
            lebendig: true,
            macht: 0,
            auth_methode: None,
        }));
        self.per_name.insert(name_schluessel(name), Rc::clone(&teilnehmer));
        self.per_id.insert(id, Rc::clone(&teilnehmer));
        self.per_identitaet.insert(identitaet, Rc::clone(&teilnehmer));

        tracing::debug!(name, id = %id, raum, "Teilnehmer angelegt");
        BeitrittsErgebnis::Erstellt(teilnehmer)
    }

    /// Teilnehmer hat einen Raum verlassen (Part oder Kick)
    ///
    /// Gibt den Teilnehmer zurueck falls er dadurch entfernt wurde.
    pub fn verlassen(&mut self, name: &str, raum: &str) -> Option<TeilnehmerRef> {
        let teilnehmer = Rc::clone(self.per_name.get(&name_schluessel(name))?);
        let leer = {
            let mut t = teilnehmer.borrow_mut();
            t.raeume.remove(raum);
            t.raeume.is_empty()
        };
        tracing::debug!(name, raum, "Raum von Teilnehmer entfernt");

        if leer {
            self.loeschen(&teilnehmer);
            Some(teilnehmer)
        } else {
            None
        }
    }

    /// Teilnehmer hat den Server verlassen – unabhaengig von seinen Raeumen
    pub fn beendet(&mut self, name: &str) -> Option<TeilnehmerRef> {
        let teilnehmer = Rc::clone(self.per_name.get(&name_schluessel(name))?);
        teilnehmer.borrow_mut().raeume.clear();
        self.loeschen(&teilnehmer);
        Some(teilnehmer)
    }

    /// Der Bot selbst hat einen Raum verlassen: niemand teilt ihn mehr
    ///
    /// Gibt alle dadurch entfernten Teilnehmer zurueck.
    pub fn raum_aufgeben(&mut self, raum: &str) -> Vec<TeilnehmerRef> {
        let namen: Vec<String> = self
            .per_name
            .iter()
            .filter(|(_, t)| t.borrow().raeume.contains(raum))
            .map(|(name, _)| name.clone())
            .collect();

        namen
            .iter()
            .filter_map(|name| self.verlassen(name, raum))
            .collect()
    }

    /// Teilnehmer hat den Anzeigenamen geaendert
    ///
    /// ID und Attribute bleiben erhalten. Traegt bereits ein anderer
    /// Teilnehmer den neuen Namen, wird dieser ueberschrieben (der letzte
    /// Schreiber gewinnt) und als entfernt markiert.
    pub fn umbenannt(&mut self, alt: &str, neu: &str) -> Option<Umbenennung> {
        let teilnehmer = self.per_name.remove(&name_schluessel(alt))?;
        teilnehmer.borrow_mut().name = neu.to_string();

        let verdraengt = match self.per_name.insert(name_schluessel(neu), Rc::clone(&teilnehmer)) {
            Some(alter) if !Rc::ptr_eq(&alter, &teilnehmer) => {
                let (alter_id, alte_identitaet) = {
                    let mut a = alter.borrow_mut();
                    a.lebendig = false;
                    (a.id, a.identitaet.clone())
                };
                self.per_id.remove(&alter_id);
                self.identitaet_austragen(&alte_identitaet, &alter);
                tracing::warn!(
                    alt,
                    neu,
                    verdraengt = %alter_id,
                    "Namenskollision bei Umbenennung, bisheriger Traeger ueberschrieben"
                );
                Some(alter)
            }
            _ => None,
        };

        tracing::debug!(alt, neu, "Anzeigename geaendert");
        Some(Umbenennung {
            teilnehmer,
            verdraengt,
        })
    }

    /// Sucht einen Teilnehmer per Anzeigename
    pub fn per_name(&self, name: &str) -> Option<TeilnehmerRef> {
        self.per_name.get(&name_schluessel(name)).cloned()
    }

    /// Sucht einen Teilnehmer per stabiler ID
    pub fn per_id(&self, id: TeilnehmerId) -> Option<TeilnehmerRef> {
        self.per_id.get(&id).cloned()
    }

    /// Sucht einen Teilnehmer per sekundaerer Identitaet (user@host)
    pub fn per_identitaet(&self, identitaet: &SekundaereIdentitaet) -> Option<TeilnehmerRef> {
        self.per_identitaet.get(identitaet).cloned()
    }

    /// Alle Teilnehmer in einem Raum
    pub fn in_raum(&self, raum: &str) -> Vec<TeilnehmerRef> {
        self.per_name
            .values()
            .filter(|t| t.borrow().raeume.contains(raum))
            .cloned()
            .collect()
    }

    /// Alle bekannten Teilnehmer
    pub fn alle(&self) -> Vec<TeilnehmerRef> {
        self.per_name.values().cloned().collect()
    }

    /// Anzahl bekannter Teilnehmer
    pub fn anzahl(&self) -> usize {
        self.per_name.len()
    }

    /// Vergisst alle Teilnehmer (z.B. nach Verbindungsverlust)
    pub fn leeren(&mut self) {
        for teilnehmer in self.per_name.values() {
            teilnehmer.borrow_mut().lebendig = false;
        }
        self.per_name.clear();
        self.per_id.clear();
        self.per_identitaet.clear();
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn loeschen(&mut self, teilnehmer: &TeilnehmerRef) {
        let (name, id, identitaet) = {
            let mut t = teilnehmer.borrow_mut();
            t.lebendig = false;
            (t.name.clone(), t.id, t.identitaet.clone())
        };
        self.per_name.remove(&name_schluessel(&name));
        self.per_id.remove(&id);
        self.identitaet_austragen(&identitaet, teilnehmer);
        tracing::debug!(name = %name, id = %id, "Teilnehmer entfernt");
    }

    /// Traegt den Teilnehmer aus dem Identitaets-Index aus
    ///
    /// Zeigt der Eintrag auf ihn, uebernimmt ein verbliebener Teilnehmer mit
    /// derselben Identitaet.
    fn identitaet_austragen(&mut self, identitaet: &SekundaereIdentitaet, teilnehmer: &TeilnehmerRef) {
        let eigener = self
            .per_identitaet
            .get(identitaet)
            .is_some_and(|t| Rc::ptr_eq(t, teilnehmer));
        if !eigener {
            return;
        }
        match self
            .per_name
            .values()
            .find(|t| !Rc::ptr_eq(t, teilnehmer) && t.borrow().identitaet == *identitaet)
        {
            Some(nachfolger) => {
                self.per_identitaet
                    .insert(identitaet.clone(), Rc::clone(nachfolger));
            }
            None => {
                self.per_identitaet.remove(identitaet);
            }
        }
    }
}

/// Schluessel im Namens-Index
fn name_schluessel(name: &str) -> String {
    name.to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
