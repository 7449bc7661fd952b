//! Dispatcher – Registrierung, Abonnements und Ausstrahlung
//!
//! Zentrale Komponente die Erweiterungen, Befehle und Ereignisse
//! zusammenfuehrt. Alles laeuft auf einem Thread; Handler sind synchron
//! und duerfen den Dispatcher waehrend einer Ausstrahlung veraendern
//! (abbestellen, neu registrieren, verzoegert planen).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::DispatchError;
use crate::events::{Abonnement, Ereignis};
use crate::kontext::Kontext;
use crate::routen::Erweiterung;
use crate::types::{HandlerId, VerzoegerterAufruf, Zustellung};

/// Typ-geloeschter Handler
pub type Handler = Rc<dyn Fn(&Ereignis, &mut Kontext<'_>) -> anyhow::Result<()>>;

fn handler<F>(f: F) -> Handler
where
    F: Fn(&Ereignis, &mut Kontext<'_>) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

#[derive(Clone)]
struct Route {
    id: HandlerId,
    name: &'static str,
    handler: Handler,
}

#[derive(Default)]
struct Routen {
    per_schluessel: HashMap<Abonnement, Vec<Route>>,
    erweiterungen: Vec<(HandlerId, &'static str)>,
}

/// Dispatcher fuer Befehle und Ereignisse
#[derive(Default)]
pub struct Dispatcher {
    routen: RefCell<Routen>,
    letzte_id: Cell<u64>,
    geplant: RefCell<Vec<VerzoegerterAufruf>>,
}

impl Dispatcher {
    pub fn neu() -> Self {
        Self::default()
    }

    fn naechste_id(&self) -> HandlerId {
        let id = self.letzte_id.get() + 1;
        self.letzte_id.set(id);
        HandlerId(id)
    }

    /// Registriert eine Erweiterung mit allen Eintraegen ihrer Routentabelle
    pub fn registrieren<E: Erweiterung>(&self, erweiterung: E) -> HandlerId {
        self.registrieren_geteilt(Rc::new(RefCell::new(erweiterung)))
    }

    /// Wie [`registrieren`](Self::registrieren), der Aufrufer behaelt aber
    /// einen Zugriff auf den Zustand der Erweiterung
    pub fn registrieren_geteilt<E: Erweiterung>(&self, erweiterung: Rc<RefCell<E>>) -> HandlerId {
        let id = self.naechste_id();
        let name = erweiterung.borrow().name();
        let tabelle = E::routen();

        let mut routen = self.routen.borrow_mut();
        for (abo, methode) in tabelle.eintraege() {
            let methode = *methode;
            let zelle = Rc::clone(&erweiterung);
            let route = Route {
                id,
                name,
                handler: handler(move |ereignis, ctx| {
                    let mut erw = zelle
                        .try_borrow_mut()
                        .map_err(|_| DispatchError::Beschaeftigt(name))?;
                    methode(&mut *erw, ereignis, ctx)
                }),
            };
            routen
                .per_schluessel
                .entry(abo.clone())
                .or_default()
                .push(route);
        }
        routen.erweiterungen.push((id, name));

        info!(erweiterung = name, %id, routen = tabelle.len(), "Erweiterung registriert");
        id
    }

    /// Abonniert einen einzelnen Schluessel mit einer Closure
    pub fn abonnieren<F>(&self, abo: Abonnement, name: &'static str, f: F) -> HandlerId
    where
        F: Fn(&Ereignis, &mut Kontext<'_>) -> anyhow::Result<()> + 'static,
    {
        let id = self.naechste_id();
        debug!(%abo, name, %id, "Abonnement eingetragen");
        self.routen
            .borrow_mut()
            .per_schluessel
            .entry(abo)
            .or_default()
            .push(Route {
                id,
                name,
                handler: handler(f),
            });
        id
    }

    /// Entfernt alle Abonnements einer ID aus allen Schluesseln
    ///
    /// Eine laufende Ausstrahlung ist nicht betroffen: sie arbeitet auf
    /// einer Momentaufnahme der Handler-Liste.
    pub fn abbestellen(&self, id: HandlerId) -> Result<(), DispatchError> {
        let mut routen = self.routen.borrow_mut();
        let mut gefunden = false;
        routen.per_schluessel.retain(|_, liste| {
            let vorher = liste.len();
            liste.retain(|r| r.id != id);
            gefunden |= liste.len() != vorher;
            !liste.is_empty()
        });
        routen.erweiterungen.retain(|(eid, _)| *eid != id);

        if gefunden {
            debug!(%id, "Abonnements entfernt");
            Ok(())
        } else {
            Err(DispatchError::NichtGefunden(id))
        }
    }

    /// Strahlt einen Befehl an alle Handler des Tokens aus
    pub fn befehl_veroeffentlichen(
        &self,
        quelle: &str,
        ziel: &str,
        argv: Vec<String>,
        ctx: &mut Kontext<'_>,
    ) -> Zustellung {
        let ereignis = Ereignis::Befehl {
            quelle: quelle.to_string(),
            ziel: ziel.to_string(),
            argv,
        };
        self.ereignis_veroeffentlichen(&ereignis, ctx)
    }

    /// Strahlt ein Ereignis an alle Handler seines Schluessels aus
    ///
    /// Fehler und Abstuerze einzelner Handler werden protokolliert und
    /// gezaehlt; die restlichen Handler laufen trotzdem.
    pub fn ereignis_veroeffentlichen(
        &self,
        ereignis: &Ereignis,
        ctx: &mut Kontext<'_>,
    ) -> Zustellung {
        let schluessel = ereignis.schluessel();
        let momentaufnahme: Vec<Route> = self
            .routen
            .borrow()
            .per_schluessel
            .get(&schluessel)
            .cloned()
            .unwrap_or_default();

        let mut zustellung = Zustellung::default();
        if momentaufnahme.is_empty() {
            if let Abonnement::Befehl(token) = &schluessel {
                debug!(befehl = %token, "Unbekannter Befehl");
            }
            return zustellung;
        }

        for route in &momentaufnahme {
            let ergebnis =
                panic::catch_unwind(AssertUnwindSafe(|| (route.handler)(ereignis, &mut *ctx)));
            match ergebnis {
                Ok(Ok(())) => zustellung.aufgerufen += 1,
                Ok(Err(e)) => {
                    zustellung.fehlgeschlagen += 1;
                    error!(handler = route.name, %schluessel, fehler = %e, "Handler fehlgeschlagen");
                }
                Err(nutzlast) => {
                    zustellung.fehlgeschlagen += 1;
                    let fehler = DispatchError::Panik {
                        name: route.name.to_string(),
                        meldung: panik_meldung(nutzlast.as_ref()),
                    };
                    error!(%schluessel, "{fehler}");
                }
            }
        }
        zustellung
    }

    /// Merkt eine verzoegerte Ausfuehrung vor
    pub fn verzoegert_planen(
        &self,
        verzoegerung: Duration,
        art: impl Into<String>,
        parameter: Vec<String>,
    ) {
        let aufruf = VerzoegerterAufruf {
            verzoegerung,
            art: art.into(),
            parameter,
        };
        debug!(art = %aufruf.art, verzoegerung_sek = verzoegerung.as_secs(), "Verzoegerter Aufruf geplant");
        self.geplant.borrow_mut().push(aufruf);
    }

    /// Entnimmt alle seit dem letzten Aufruf geplanten Ausfuehrungen
    pub fn geplante_entnehmen(&self) -> Vec<VerzoegerterAufruf> {
        std::mem::take(&mut *self.geplant.borrow_mut())
    }

    /// Alle Befehls-Tokens mit mindestens einem Handler, sortiert
    pub fn befehle(&self) -> Vec<String> {
        let mut befehle: Vec<String> = self
            .routen
            .borrow()
            .per_schluessel
            .keys()
            .filter_map(|abo| match abo {
                Abonnement::Befehl(token) => Some(token.to_string()),
                Abonnement::Ereignis(_) => None,
            })
            .collect();
        befehle.sort();
        befehle
    }

    /// Namen aller registrierten Erweiterungen in Registrierungsreihenfolge
    pub fn erweiterungen(&self) -> Vec<&'static str> {
        self.routen
            .borrow()
            .erweiterungen
            .iter()
            .map(|(_, name)| *name)
            .collect()
    }

    /// Anzahl der Handler fuer einen Schluessel
    pub fn anzahl_handler(&self, abo: &Abonnement) -> usize {
        self.routen
            .borrow()
            .per_schluessel
            .get(abo)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn panik_meldung(nutzlast: &(dyn Any + Send)) -> String {
    if let Some(s) = nutzlast.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = nutzlast.downcast_ref::<String>() {
        s.clone()
    } else {
        "unbekannte Ursache".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
