//! Waechter – Moderations-Zustandsautomat
//!
//! Pro `(raum, identitaet)` laeuft ein Vorgang durch
//! `Ausstehend -> Gebannt -> (aufgehoben)`. Das Raum-Privileg wird genau dann
//! gehalten, wenn fuer den Raum Vorgaenge existieren; `abgleichen` stellt das
//! am Ende jedes Handlers her.
//!
//! Unabhaengig davon versucht der Waechter, nach einem Kick sofort und nach
//! "banned from channel" begrenzt oft wieder beizutreten.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use shirk_core::event::AusgehenderBefehl;
use shirk_core::types::SekundaereIdentitaet;
use shirk_dispatch::{
    ist_raum, Abonnement, DispatchError, Dispatcher, Ereignis, EreignisArt, Erweiterung, Kontext,
    Routentabelle,
};

use crate::config::WaechterKonfig;
use crate::log::WiederherstellungsLog;
use crate::zustand::{
    frist_berechnen, AusstehenderKnockout, ModerationsSchluessel, ModerationsZustand, RaumZustand,
    WiederherstellungsEintrag,
};

/// Art des periodischen Wiederherstellungs-Scans
pub const SCAN: &str = "scan";
/// Art des verzoegerten Beitritts
pub const REJOIN: &str = "rejoin";

/// Numerische Antwort "Cannot join channel (+b)"
const ERR_BANNEDFROMCHAN: u16 = 474;

/// Moderations-Erweiterung
pub struct WaechterErweiterung {
    konfig: WaechterKonfig,
    /// Raeume fuer `!rejoin`
    raeume_konfiguriert: Vec<String>,
    vorgaenge: HashMap<ModerationsSchluessel, ModerationsZustand>,
    raeume: HashMap<String, RaumZustand>,
    log: WiederherstellungsLog,
    /// Letzter Schreibversuch ist fehlgeschlagen
    log_veraltet: bool,
    log_schreibfehler: u64,
    scan_geplant: bool,
}

impl WaechterErweiterung {
    /// Erstellt den Waechter und uebernimmt alle Eintraege aus dem Log
    pub fn neu(konfig: WaechterKonfig, raeume_konfiguriert: Vec<String>) -> Self {
        let log = WiederherstellungsLog::neu(konfig.log_pfad.clone());
        let mut vorgaenge = HashMap::new();
        match log.laden() {
            Ok(eintraege) => {
                info!(
                    anzahl = eintraege.len(),
                    pfad = %log.pfad().display(),
                    "Wiederherstellungs-Log geladen"
                );
                for eintrag in eintraege {
                    vorgaenge.insert(eintrag.schluessel(), ModerationsZustand::Gebannt(eintrag));
                }
            }
            Err(e) if e.ist_inhaltsfehler() => {
                error!(fehler = %e, "Wiederherstellungs-Log unbrauchbar");
                match log.beiseite_legen() {
                    Ok(sicherung) => warn!(
                        sicherung = %sicherung.display(),
                        "Unbrauchbares Log beiseitegelegt, starte ohne Eintraege"
                    ),
                    Err(e) => error!(fehler = %e, "Unbrauchbares Log konnte nicht beiseitegelegt werden"),
                }
            }
            Err(e) => {
                error!(fehler = %e, "Wiederherstellungs-Log konnte nicht geladen werden");
            }
        }

        Self {
            konfig,
            raeume_konfiguriert,
            vorgaenge,
            raeume: HashMap::new(),
            log,
            log_veraltet: false,
            log_schreibfehler: 0,
            scan_geplant: false,
        }
    }

    /// Registriert den Waechter samt der verbotenen Befehle aus der Konfiguration
    ///
    /// Gibt einen geteilten Zugriff auf den Zustand zurueck.
    pub fn anmelden(self, dispatcher: &Dispatcher) -> Rc<RefCell<Self>> {
        let verboten = self.konfig.verbotene_befehle.clone();
        let geteilt = Rc::new(RefCell::new(self));
        dispatcher.registrieren_geteilt(Rc::clone(&geteilt));

        for token in verboten {
            let zelle = Rc::clone(&geteilt);
            dispatcher.abonnieren(
                Abonnement::Befehl(Cow::Owned(token)),
                "Guard",
                move |ereignis, ctx| {
                    let mut waechter = zelle
                        .try_borrow_mut()
                        .map_err(|_| DispatchError::Beschaeftigt("Guard"))?;
                    waechter.verbotener_befehl(ereignis, ctx)
                },
            );
        }
        geteilt
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn zustand(&self, raum: &str, identitaet: &SekundaereIdentitaet) -> Option<&ModerationsZustand> {
        self.vorgaenge
            .get(&ModerationsSchluessel::neu(raum, identitaet.clone()))
    }

    /// Alle bestaetigten Bans, nach Schluessel sortiert
    pub fn wiederherstellungen(&self) -> Vec<&WiederherstellungsEintrag> {
        let mut eintraege: Vec<_> = self
            .vorgaenge
            .values()
            .filter_map(ModerationsZustand::als_eintrag)
            .collect();
        eintraege.sort_by_key(|e| e.schluessel());
        eintraege
    }

    pub fn anzahl_ausstehend(&self) -> usize {
        self.vorgaenge.values().filter(|z| z.ist_ausstehend()).count()
    }

    pub fn raum(&self, raum: &str) -> Option<&RaumZustand> {
        self.raeume.get(raum)
    }

    pub fn hat_privileg(&self, raum: &str) -> bool {
        self.raeume.get(raum).is_some_and(|r| r.hat_privileg)
    }

    /// Fuer den Raum existiert mindestens ein Vorgang
    pub fn arbeit_vorhanden(&self, raum: &str) -> bool {
        self.vorgaenge.keys().any(|k| k.raum == raum)
    }

    pub fn log_schreibfehler(&self) -> u64 {
        self.log_schreibfehler
    }

    // -----------------------------------------------------------------------
    // Zustandsuebergaenge
    // -----------------------------------------------------------------------

    /// Legt einen Knockout an; bannt sofort, falls das Privileg schon vorliegt
    fn ausloesen(
        &mut self,
        raum: &str,
        ziel_name: &str,
        dauer_sek: u64,
        nachricht: String,
        ctx: &mut Kontext<'_>,
    ) {
        let Some(teilnehmer) = ctx.presence.per_name(ziel_name) else {
            warn!(raum, name = ziel_name, "Knockout fuer unbekannten Teilnehmer");
            return;
        };
        let (identitaet, id, name) = {
            let t = teilnehmer.borrow();
            (t.identitaet.clone(), t.id, t.name.clone())
        };

        let schluessel = ModerationsSchluessel::neu(raum, identitaet);
        match self.vorgaenge.get(&schluessel).map(ModerationsZustand::ist_ausstehend) {
            Some(true) if self.hat_privileg(raum) => {
                // Erneut ausgeloest, Ban aber nie bestaetigt
                self.erneut_bannen(raum, &[schluessel], ctx);
                return;
            }
            Some(ausstehend) => {
                debug!(%schluessel, ausstehend, "Knockout laeuft bereits");
                return;
            }
            None => {}
        }

        info!(%schluessel, name = %name, dauer_sek, "Knockout ausgeloest");
        let ban_versuche = if self.hat_privileg(raum) {
            ban_senden(&schluessel, ctx);
            1
        } else {
            0
        };
        self.vorgaenge.insert(
            schluessel,
            ModerationsZustand::Ausstehend(AusstehenderKnockout {
                dauer_sek,
                nachricht,
                name,
                teilnehmer_id: Some(id),
                ban_versuche,
            }),
        );
    }

    /// Alle ausstehenden Knockouts eines Raums, sortiert
    fn ausstehende(&self, raum: &str) -> Vec<ModerationsSchluessel> {
        let mut schluessel: Vec<ModerationsSchluessel> = self
            .vorgaenge
            .iter()
            .filter(|(k, z)| k.raum == raum && z.ist_ausstehend())
            .map(|(k, _)| k.clone())
            .collect();
        schluessel.sort();
        schluessel
    }

    /// Sendet den Ban fuer ausstehende Knockouts (erneut); setzt das Privileg voraus
    ///
    /// Nach `max_ban_versuche` unbestaetigten Anfragen wird der Knockout
    /// verworfen, damit das Privileg wieder abgegeben werden kann.
    fn erneut_bannen(
        &mut self,
        raum: &str,
        schluessel: &[ModerationsSchluessel],
        ctx: &mut Kontext<'_>,
    ) {
        let max = self.konfig.max_ban_versuche;
        for k in schluessel {
            let Some(ModerationsZustand::Ausstehend(knockout)) = self.vorgaenge.get_mut(k) else {
                continue;
            };
            if knockout.ban_versuche >= max {
                warn!(
                    %k,
                    versuche = knockout.ban_versuche,
                    "Ban nie bestaetigt – Knockout verworfen"
                );
                self.vorgaenge.remove(k);
                continue;
            }
            knockout.ban_versuche += 1;
            if knockout.ban_versuche > 1 {
                info!(%k, raum, versuch = knockout.ban_versuche, max, "Ban wird erneut angefordert");
            }
            ban_senden(k, ctx);
        }
    }

    fn privileg_erhalten(&mut self, raum: &str, ctx: &mut Kontext<'_>) {
        let r = self.raeume.entry(raum.to_string()).or_default();
        r.hat_privileg = true;
        r.angefordert = false;
        info!(raum, "Privileg erhalten");

        let ausstehend = self.ausstehende(raum);
        if ausstehend.is_empty() {
            self.faellige_aufheben(raum, ctx);
            return;
        }
        self.erneut_bannen(raum, &ausstehend, ctx);
    }

    fn privileg_verloren(&mut self, raum: &str) {
        let r = self.raeume.entry(raum.to_string()).or_default();
        r.hat_privileg = false;
        r.angefordert = false;
        info!(raum, "Privileg verloren");
    }

    /// Eigener Ban wurde bestaetigt: kicken und auf die Frist warten
    fn ban_bestaetigt(&mut self, raum: &str, maske: &str, ctx: &mut Kontext<'_>) {
        let Some(identitaet) = SekundaereIdentitaet::aus_banmaske(maske) else {
            warn!(raum, maske, "Eigener Ban mit unbekannter Maske");
            return;
        };
        let schluessel = ModerationsSchluessel::neu(raum, identitaet);

        let knockout = match self.vorgaenge.get(&schluessel) {
            Some(ModerationsZustand::Ausstehend(k)) => k.clone(),
            Some(ModerationsZustand::Gebannt(_)) => {
                debug!(%schluessel, "Ban bereits bestaetigt");
                return;
            }
            None => {
                warn!(%schluessel, "Ban-Bestaetigung ohne ausstehenden Knockout – ignoriert");
                return;
            }
        };

        let name = knockout
            .teilnehmer_id
            .and_then(|id| ctx.presence.per_id(id))
            .or_else(|| ctx.presence.per_identitaet(&schluessel.identitaet))
            .filter(|t| t.borrow().lebendig)
            .map(|t| t.borrow().name.clone())
            .unwrap_or_else(|| knockout.name.clone());

        ctx.senden(AusgehenderBefehl::Kick {
            raum: raum.to_string(),
            name: name.clone(),
            grund: knockout.nachricht.clone(),
        });

        let eintrag = WiederherstellungsEintrag {
            raum: raum.to_string(),
            identitaet: schluessel.identitaet.clone(),
            name,
            frist: frist_berechnen(ctx.jetzt, knockout.dauer_sek),
            dauer_sek: knockout.dauer_sek,
            nachricht: knockout.nachricht,
        };
        info!(%schluessel, name = %eintrag.name, frist = %eintrag.frist, "Gebannt und gekickt");
        self.vorgaenge
            .insert(schluessel, ModerationsZustand::Gebannt(eintrag));
        self.speichern();
    }

    /// Ban wurde aufgehoben (durch uns oder von Hand)
    fn unban_bestaetigt(&mut self, raum: &str, maske: &str) {
        let Some(identitaet) = SekundaereIdentitaet::aus_banmaske(maske) else {
            return;
        };
        let schluessel = ModerationsSchluessel::neu(raum, identitaet);
        if let Some(ModerationsZustand::Gebannt(_)) = self.vorgaenge.get(&schluessel) {
            self.vorgaenge.remove(&schluessel);
            info!(%schluessel, "Ban aufgehoben");
            self.speichern();
        }
    }

    /// Hebt alle faelligen Bans eines Raums auf; setzt das Privileg voraus
    fn faellige_aufheben(&mut self, raum: &str, ctx: &mut Kontext<'_>) -> usize {
        let jetzt = ctx.jetzt;
        let mut faellig: Vec<ModerationsSchluessel> = self
            .vorgaenge
            .iter()
            .filter_map(|(k, z)| {
                z.als_eintrag()
                    .filter(|e| e.raum == raum && e.ist_faellig(jetzt))
                    .map(|_| k.clone())
            })
            .collect();
        if faellig.is_empty() {
            return 0;
        }
        faellig.sort();

        for schluessel in &faellig {
            ctx.senden(AusgehenderBefehl::Modus {
                raum: raum.to_string(),
                modus: format!("-b {}", schluessel.identitaet.banmaske()),
            });
            self.vorgaenge.remove(schluessel);
            info!(%schluessel, "Frist abgelaufen – Ban aufgehoben");
        }
        self.speichern();
        faellig.len()
    }

    /// Schreibt alle bestaetigten Bans ins Log
    ///
    /// Ein Fehler beendet nichts: der Speicherzustand bleibt massgeblich und
    /// der naechste Aufruf (spaetestens der naechste Scan) versucht es erneut.
    fn speichern(&mut self) {
        let ergebnis = self.log.schreiben(
            self.vorgaenge
                .values()
                .filter_map(ModerationsZustand::als_eintrag),
        );
        match ergebnis {
            Ok(()) => {
                if self.log_veraltet {
                    info!("Wiederherstellungs-Log wieder geschrieben");
                }
                self.log_veraltet = false;
            }
            Err(e) => {
                self.log_veraltet = true;
                self.log_schreibfehler += 1;
                error!(fehler = %e, "Wiederherstellungs-Log nicht geschrieben");
            }
        }
    }

    /// Fordert das Privileg an oder gibt es ab, je nachdem ob Arbeit ansteht
    fn abgleichen(&mut self, ctx: &mut Kontext<'_>) {
        let mut raeume: BTreeSet<String> = self.raeume.keys().cloned().collect();
        raeume.extend(self.vorgaenge.keys().map(|k| k.raum.clone()));

        for raum in raeume {
            let arbeit = self.arbeit_vorhanden(&raum);
            let r = self.raeume.entry(raum.clone()).or_default();
            if r.hat_privileg && !arbeit {
                r.hat_privileg = false;
                r.angefordert = false;
                ctx.senden(AusgehenderBefehl::Roh {
                    zeile: self.konfig.abgabe_fuer(&raum),
                });
                info!(raum = %raum, "Privileg abgegeben");
            } else if !r.hat_privileg && arbeit && !r.angefordert && r.beigetreten {
                r.angefordert = true;
                ctx.senden(AusgehenderBefehl::Roh {
                    zeile: self.konfig.anforderung_fuer(&raum),
                });
                info!(raum = %raum, "Privileg angefordert");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handler
    // -----------------------------------------------------------------------

    /// `!knockout <name> [minuten] [nachricht...]`
    fn cmd_knockout(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, argv } = e else {
            return Ok(());
        };
        if ctx.macht(quelle) < self.konfig.knockout_stufe {
            debug!(quelle = %quelle, "!knockout ohne ausreichende Stufe ignoriert");
            return Ok(());
        }
        if !ist_raum(ziel) {
            ctx.antworten(quelle, ziel, "!knockout only works in a room.");
            return Ok(());
        }
        let Some(name) = argv.get(1) else {
            ctx.antworten(
                quelle,
                ziel,
                format!("{quelle}: usage: !knockout <name> [minutes] [message...]"),
            );
            return Ok(());
        };
        if ctx.ist_selbst(name) {
            ctx.antworten(quelle, ziel, format!("{quelle}: I won't knock myself out."));
            return Ok(());
        }
        if ctx.presence.per_name(name).is_none() {
            ctx.antworten(quelle, ziel, format!("{quelle}: I don't know anyone called {name}."));
            return Ok(());
        }

        let (dauer_sek, rest) = match argv.get(2).and_then(|m| m.parse::<u64>().ok()) {
            Some(minuten) => (minuten.saturating_mul(60), argv.get(3..)),
            None => (self.konfig.ban_dauer_sek, argv.get(2..)),
        };
        let nachricht = rest
            .filter(|r| !r.is_empty())
            .map(|r| r.join(" "))
            .unwrap_or_else(|| self.konfig.standard_nachricht.clone());

        ctx.antworten(quelle, ziel, format!("{quelle}: Please wait, processing your request."));
        self.ausloesen(ziel, name, dauer_sek, nachricht, ctx);
        self.abgleichen(ctx);
        Ok(())
    }

    /// Verbotener Befehl unterhalb der Knockout-Stufe trifft den Absender
    fn verbotener_befehl(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, argv } = e else {
            return Ok(());
        };
        if ctx.macht(quelle) >= self.konfig.knockout_stufe || !ist_raum(ziel) {
            return Ok(());
        }
        let befehl = argv.first().map(String::as_str).unwrap_or_default();
        info!(quelle = %quelle, raum = %ziel, befehl, "Verbotener Befehl benutzt");

        ctx.antworten(quelle, ziel, format!("{quelle}: Please wait, processing your request."));
        let dauer_sek = self.konfig.ban_dauer_sek;
        let nachricht = self.konfig.standard_nachricht.clone();
        self.ausloesen(ziel, quelle, dauer_sek, nachricht, ctx);
        self.abgleichen(ctx);
        Ok(())
    }

    /// `!rejoin` – alle konfigurierten Raeume erneut betreten
    fn cmd_rejoin(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, .. } = e else {
            return Ok(());
        };
        if ctx.macht(quelle) < self.konfig.rejoin_stufe {
            debug!(quelle = %quelle, "!rejoin ohne ausreichende Stufe ignoriert");
            return Ok(());
        }
        for raum in &self.raeume_konfiguriert {
            ctx.senden(AusgehenderBefehl::Beitreten { raum: raum.clone() });
        }
        Ok(())
    }

    fn modus(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Modus {
            quelle,
            raum,
            hinzugefuegt,
            modus,
            argumente,
        } = e
        else {
            return Ok(());
        };
        let Some(argument) = argumente.first() else {
            return Ok(());
        };
        let setzer = quelle.split('!').next().unwrap_or(quelle);

        match (*modus, *hinzugefuegt) {
            ('o', true) if ctx.ist_selbst(argument) => self.privileg_erhalten(raum, ctx),
            ('o', false) if ctx.ist_selbst(argument) => self.privileg_verloren(raum),
            ('b', true) if ctx.ist_selbst(setzer) => self.ban_bestaetigt(raum, argument, ctx),
            ('b', true) => debug!(raum = %raum, setzer, maske = %argument, "Fremder Ban"),
            ('b', false) => self.unban_bestaetigt(raum, argument),
            _ => {}
        }
        self.abgleichen(ctx);
        Ok(())
    }

    /// Periodischer Scan: unbestaetigte Bans wiederholen, faellige Bans
    /// aufheben, Privileg erneut anfordern
    fn scan(&mut self, _: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        if self.log_veraltet {
            self.speichern();
        }

        let raeume: BTreeSet<String> = self.vorgaenge.keys().map(|k| k.raum.clone()).collect();
        for raum in raeume {
            if self.hat_privileg(&raum) {
                let ausstehend = self.ausstehende(&raum);
                self.erneut_bannen(&raum, &ausstehend, ctx);
                self.faellige_aufheben(&raum, ctx);
            } else if let Some(r) = self.raeume.get_mut(&raum) {
                // Unbeantwortete Anforderung wiederholen
                r.angefordert = false;
            }
        }

        ctx.verzoegert_planen(self.konfig.scan_intervall(), SCAN, Vec::new());
        self.abgleichen(ctx);
        Ok(())
    }

    fn angemeldet(&mut self, _: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        // Neue Verbindung: kein Raum betreten, kein Privileg
        for r in self.raeume.values_mut() {
            r.beigetreten = false;
            r.hat_privileg = false;
            r.angefordert = false;
        }
        if !self.scan_geplant {
            self.scan_geplant = true;
            ctx.verzoegert_planen(self.konfig.scan_intervall(), SCAN, Vec::new());
        }
        Ok(())
    }

    fn beigetreten(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Beigetreten { name, raum } = e else {
            return Ok(());
        };
        if !ctx.ist_selbst(name) {
            return Ok(());
        }
        let r = self.raeume.entry(raum.clone()).or_default();
        r.beigetreten = true;
        r.rejoin_versuche = 0;
        debug!(raum = %raum, "Raum betreten, Rejoin-Zaehler zurueckgesetzt");
        self.abgleichen(ctx);
        Ok(())
    }

    fn verlassen(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Verlassen { name, raum } = e else {
            return Ok(());
        };
        if ctx.ist_selbst(name) {
            let r = self.raeume.entry(raum.clone()).or_default();
            r.beigetreten = false;
            r.hat_privileg = false;
            r.angefordert = false;
        }
        Ok(())
    }

    /// Bot wurde gekickt: sofort und ohne Zaehler erneut beitreten
    fn gekickt_aus(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::GekicktAus { raum, kicker, grund } = e else {
            return Ok(());
        };
        info!(raum = %raum, kicker = %kicker, grund = %grund, "Aus Raum gekickt");
        let r = self.raeume.entry(raum.clone()).or_default();
        r.beigetreten = false;
        r.hat_privileg = false;
        r.angefordert = false;
        ctx.verzoegert_planen(Duration::ZERO, REJOIN, vec![raum.clone()]);
        Ok(())
    }

    /// `474 <ich> <raum> :Cannot join channel (+b)`
    fn gesperrt(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Roh { parameter, .. } = e else {
            return Ok(());
        };
        let Some(raum) = parameter.get(1) else {
            anyhow::bail!("474 ohne Raum: {parameter:?}");
        };
        let max = self.konfig.max_rejoin_versuche;
        let pause = self.konfig.rejoin_pause();

        let r = self.raeume.entry(raum.clone()).or_default();
        if r.rejoin_versuche < max {
            r.rejoin_versuche += 1;
            info!(
                raum = %raum,
                versuch = r.rejoin_versuche,
                max,
                pause_sek = pause.as_secs(),
                "Im Raum gebannt – erneuter Beitritt geplant"
            );
            ctx.verzoegert_planen(pause, REJOIN, vec![raum.clone()]);
        } else {
            warn!(raum = %raum, max, "Im Raum gebannt – keine weiteren Versuche");
        }
        Ok(())
    }

    fn rejoin_faellig(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Verzoegert { parameter, .. } = e else {
            return Ok(());
        };
        if let Some(raum) = parameter.first() {
            ctx.senden(AusgehenderBefehl::Beitreten { raum: raum.clone() });
        }
        Ok(())
    }
}

fn ban_senden(schluessel: &ModerationsSchluessel, ctx: &mut Kontext<'_>) {
    info!(%schluessel, "Ban angefordert");
    ctx.senden(AusgehenderBefehl::Modus {
        raum: schluessel.raum.clone(),
        modus: format!("+b {}", schluessel.identitaet.banmaske()),
    });
}

impl Erweiterung for WaechterErweiterung {
    fn name(&self) -> &'static str {
        "Guard"
    }

    fn routen() -> Routentabelle<Self> {
        Routentabelle::neu()
            .befehl("knockout", Self::cmd_knockout)
            .befehl("rejoin", Self::cmd_rejoin)
            .ereignis(EreignisArt::Modus, Self::modus)
            .ereignis(EreignisArt::Angemeldet, Self::angemeldet)
            .ereignis(EreignisArt::Beigetreten, Self::beigetreten)
            .ereignis(EreignisArt::Verlassen, Self::verlassen)
            .ereignis(EreignisArt::GekicktAus, Self::gekickt_aus)
            .ereignis(EreignisArt::Roh(ERR_BANNEDFROMCHAN), Self::gesperrt)
            .verzoegert(SCAN, Self::scan)
            .verzoegert(REJOIN, Self::rejoin_faellig)
    }
}
