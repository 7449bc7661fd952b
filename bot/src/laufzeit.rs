//! Event-Schleife des Bots
//!
//! Ein einziger Task verarbeitet Ereignisse nacheinander bis zum Ende:
//! Transport-Ereignis annehmen, Presence-Registry nachziehen, Ereignisse
//! ausstrahlen, Ausgangspuffer an den Transport geben. Verzoegerte
//! Ausfuehrungen laufen als tokio-Timer, die in dieselbe Schleife
//! zurueckmelden. Dispatcher, Registry und Timer ueberleben Reconnects.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use shirk_auth::AuthErweiterung;
use shirk_core::event::{AusgehenderBefehl, TransportEreignis};
use shirk_core::transport::Transport;
use shirk_core::types::SekundaereIdentitaet;
use shirk_dispatch::{ist_raum, Dispatcher, Ereignis, Kontext, VerzoegerterAufruf};
use shirk_guard::WaechterErweiterung;
use shirk_observability::{HealthState, ShirkMetrics};
use shirk_presence::{BeitrittsErgebnis, PresenceRegistry, Teilnehmer};

use crate::config::BotConfig;
use crate::erweiterungen::{KernErweiterung, QuitErweiterung};

/// Antwort auf WHO: `<ich> <raum> <user> <host> <server> <nick> <flags> :<hops> <name>`
const RPL_WHOREPLY: u16 = 352;

/// Nick bereits vergeben
const ERR_NICKNAMEINUSE: u16 = 433;

/// Wartezeit auf die Trennung nach einem QUIT
const QUIT_FRIST: Duration = Duration::from_secs(5);

/// Warum eine Sitzung geendet hat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitzungsende {
    /// Verbindung verloren, neu verbinden
    Getrennt(String),
    /// Herunterfahren angefordert
    Beendet,
}

enum Eingang {
    Transport(Option<TransportEreignis>),
    Timer(VerzoegerterAufruf),
}

/// Laufzeitzustand des Bots
pub struct Bot {
    dispatcher: Dispatcher,
    presence: PresenceRegistry,
    eigener_nick: String,
    befehls_praefix: String,
    waechter: Rc<RefCell<WaechterErweiterung>>,
    metriken: Option<ShirkMetrics>,
    health: HealthState,
    log_fehler_gezaehlt: u64,
    geplant: Vec<VerzoegerterAufruf>,
    timer_tx: mpsc::UnboundedSender<VerzoegerterAufruf>,
    timer_rx: mpsc::UnboundedReceiver<VerzoegerterAufruf>,
    beenden_angefordert: bool,
}

impl Bot {
    /// Baut Dispatcher und Erweiterungen aus der Konfiguration auf
    pub fn neu(config: &BotConfig) -> Self {
        let dispatcher = Dispatcher::neu();
        dispatcher.registrieren(KernErweiterung::neu(config.bot.raeume.clone()));
        dispatcher.registrieren(AuthErweiterung::neu(config.auth.clone()));
        let waechter = WaechterErweiterung::neu(config.waechter.clone(), config.bot.raeume.clone())
            .anmelden(&dispatcher);
        dispatcher.registrieren(QuitErweiterung::neu(config.bot.quit_stufe));

        info!(
            erweiterungen = ?dispatcher.erweiterungen(),
            befehle = ?dispatcher.befehle(),
            "Erweiterungen registriert"
        );

        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher,
            presence: PresenceRegistry::neu(),
            eigener_nick: config.verbindung.nickname.clone(),
            befehls_praefix: config.bot.befehls_praefix.clone(),
            waechter,
            metriken: None,
            health: HealthState::neu(),
            log_fehler_gezaehlt: 0,
            geplant: Vec::new(),
            timer_tx,
            timer_rx,
            beenden_angefordert: false,
        }
    }

    pub fn mit_observability(mut self, metriken: ShirkMetrics, health: HealthState) -> Self {
        self.metriken = Some(metriken);
        self.health = health;
        self
    }

    pub fn eigener_nick(&self) -> &str {
        &self.eigener_nick
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn waechter(&self) -> &Rc<RefCell<WaechterErweiterung>> {
        &self.waechter
    }

    pub fn beenden_angefordert(&self) -> bool {
        self.beenden_angefordert
    }

    /// Entnimmt die seit dem letzten Aufruf geplanten Ausfuehrungen
    pub fn geplante_nehmen(&mut self) -> Vec<VerzoegerterAufruf> {
        std::mem::take(&mut self.geplant)
    }

    // -----------------------------------------------------------------------
    // Verarbeitung
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Transport-Ereignis und liefert den Ausgangspuffer
    ///
    /// Die Registry wird vor der Ausstrahlung aktualisiert.
    pub fn verarbeiten(
        &mut self,
        ereignis: TransportEreignis,
        jetzt: DateTime<Utc>,
    ) -> Vec<AusgehenderBefehl> {
        let mut direkt = Vec::new();
        let ereignisse = match ereignis {
            TransportEreignis::Angemeldet => {
                info!(nick = %self.eigener_nick, "Angemeldet");
                self.health.verbindung_setzen(true);
                self.presence.leeren();
                vec![Ereignis::Angemeldet]
            }
            TransportEreignis::Beigetreten {
                name,
                benutzer,
                host,
                raum,
            } => {
                let mut ereignisse = Vec::new();
                self.teilnehmer_eintragen(&name, &benutzer, &host, &raum, &mut ereignisse);
                ereignisse.push(Ereignis::Beigetreten { name, raum });
                ereignisse
            }
            TransportEreignis::Verlassen { name, raum } => {
                let mut ereignisse = vec![Ereignis::Verlassen {
                    name: name.clone(),
                    raum: raum.clone(),
                }];
                self.raum_verlassen(&name, &raum, &mut ereignisse);
                ereignisse
            }
            TransportEreignis::Gekickt {
                raum,
                name,
                kicker,
                grund,
            } => {
                let mut ereignisse = if self.ist_selbst(&name) {
                    vec![Ereignis::GekicktAus {
                        raum: raum.clone(),
                        kicker,
                        grund,
                    }]
                } else {
                    vec![Ereignis::Verlassen {
                        name: name.clone(),
                        raum: raum.clone(),
                    }]
                };
                self.raum_verlassen(&name, &raum, &mut ereignisse);
                ereignisse
            }
            TransportEreignis::Beendet { name } => {
                let mut ereignisse = vec![Ereignis::Beendet { name: name.clone() }];
                if let Some(t) = self.presence.beendet(&name) {
                    ereignisse.push(Self::entfernt(&t.borrow()));
                }
                ereignisse
            }
            TransportEreignis::Umbenannt { alt, neu } => {
                if self.ist_selbst(&alt) {
                    info!(alt = %alt, neu = %neu, "Eigener Nick geaendert");
                    self.eigener_nick = neu.clone();
                }
                let mut ereignisse = vec![Ereignis::Umbenannt {
                    alt: alt.clone(),
                    neu: neu.clone(),
                }];
                if let Some(umbenennung) = self.presence.umbenannt(&alt, &neu) {
                    if let Some(verdraengt) = &umbenennung.verdraengt {
                        ereignisse.push(Self::entfernt(&verdraengt.borrow()));
                    }
                    let id = umbenennung.teilnehmer.borrow().id;
                    ereignisse.push(Ereignis::TeilnehmerUmbenannt { id, alt });
                }
                ereignisse
            }
            TransportEreignis::ModusGeaendert {
                quelle,
                raum,
                hinzugefuegt,
                modus,
                argumente,
            } => vec![Ereignis::Modus {
                quelle,
                raum,
                hinzugefuegt,
                modus,
                argumente,
            }],
            TransportEreignis::Numerisch { code, parameter } => {
                let mut ereignisse = Vec::new();
                match code {
                    RPL_WHOREPLY => self.who_antwort(&parameter, &mut ereignisse),
                    ERR_NICKNAMEINUSE => {
                        self.eigener_nick.push('_');
                        warn!(nick = %self.eigener_nick, "Nick vergeben, weiche aus");
                        direkt.push(AusgehenderBefehl::Roh {
                            zeile: format!("NICK {}", self.eigener_nick),
                        });
                    }
                    _ => {}
                }
                ereignisse.push(Ereignis::Roh { code, parameter });
                ereignisse
            }
            TransportEreignis::Nachricht {
                quelle,
                ziel,
                text,
                ist_aktion,
            } => self.nachricht_normalisieren(quelle, ziel, text, ist_aktion),
            TransportEreignis::Getrennt { grund } => {
                info!(grund = %grund, "Getrennt");
                self.health.verbindung_setzen(false);
                self.presence.leeren();
                Vec::new()
            }
        };

        direkt.extend(self.veroeffentlichen(&ereignisse, jetzt));
        direkt
    }

    /// Fuehrt eine faellige verzoegerte Ausfuehrung aus
    pub fn verzoegert_ausfuehren(
        &mut self,
        aufruf: VerzoegerterAufruf,
        jetzt: DateTime<Utc>,
    ) -> Vec<AusgehenderBefehl> {
        debug!(art = %aufruf.art, "Verzoegerte Ausfuehrung faellig");
        self.veroeffentlichen(&[aufruf.in_ereignis()], jetzt)
    }

    fn ist_selbst(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.eigener_nick)
    }

    fn entfernt(t: &Teilnehmer) -> Ereignis {
        Ereignis::TeilnehmerEntfernt {
            id: t.id,
            name: t.name.clone(),
        }
    }

    fn teilnehmer_eintragen(
        &mut self,
        name: &str,
        benutzer: &str,
        host: &str,
        raum: &str,
        ereignisse: &mut Vec<Ereignis>,
    ) {
        let identitaet = SekundaereIdentitaet::aus_benutzer_host(benutzer, host);
        if let BeitrittsErgebnis::Erstellt(t) = self.presence.beigetreten(name, identitaet, raum) {
            let id = t.borrow().id;
            ereignisse.push(Ereignis::TeilnehmerErstellt { id });
        }
    }

    /// Part oder Kick; verlaesst der Bot selbst, werden alle Eintraege des Raums aufgegeben
    fn raum_verlassen(&mut self, name: &str, raum: &str, ereignisse: &mut Vec<Ereignis>) {
        if self.ist_selbst(name) {
            for t in self.presence.raum_aufgeben(raum) {
                ereignisse.push(Self::entfernt(&t.borrow()));
            }
        } else if let Some(t) = self.presence.verlassen(name, raum) {
            ereignisse.push(Self::entfernt(&t.borrow()));
        }
    }

    fn who_antwort(&mut self, parameter: &[String], ereignisse: &mut Vec<Ereignis>) {
        match parameter {
            [_, raum, benutzer, host, _, nick, ..] => {
                self.teilnehmer_eintragen(nick, benutzer, host, raum, ereignisse)
            }
            _ => warn!(?parameter, "Unvollstaendige WHO-Antwort"),
        }
    }

    /// Privat- oder Raumnachricht, dazu Befehl oder direkte Ansprache
    fn nachricht_normalisieren(
        &self,
        quelle: String,
        ziel: String,
        text: String,
        ist_aktion: bool,
    ) -> Vec<Ereignis> {
        let text = text.trim().to_string();
        let mut ereignisse = Vec::new();
        if ist_raum(&ziel) {
            ereignisse.push(Ereignis::Kanalnachricht {
                quelle: quelle.clone(),
                raum: ziel.clone(),
                text: text.clone(),
                ist_aktion,
            });
        } else {
            ereignisse.push(Ereignis::Privat {
                quelle: quelle.clone(),
                text: text.clone(),
                ist_aktion,
            });
        }
        if ist_aktion {
            return ereignisse;
        }

        if let Some(argv) = self.befehl_zerlegen(&text) {
            ereignisse.push(Ereignis::Befehl { quelle, ziel, argv });
        } else if let Some(rest) = self.angesprochen(&text) {
            ereignisse.push(Ereignis::Angesprochen {
                quelle,
                ziel,
                text: rest,
            });
        }
        ereignisse
    }

    fn befehl_zerlegen(&self, text: &str) -> Option<Vec<String>> {
        let rest = text.strip_prefix(self.befehls_praefix.as_str())?;
        let argv: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
        (!argv.is_empty() && !rest.starts_with(char::is_whitespace)).then_some(argv)
    }

    /// `shirk: text` oder `shirk, text`
    fn angesprochen(&self, text: &str) -> Option<String> {
        let n = self.eigener_nick.len();
        let kopf = text.get(..n)?;
        if !kopf.eq_ignore_ascii_case(&self.eigener_nick) {
            return None;
        }
        let mut rest = text.get(n..)?.chars();
        match rest.next() {
            Some(':' | ',') => Some(rest.as_str().trim().to_string()),
            Some(c) if c.is_whitespace() => Some(rest.as_str().trim().to_string()),
            _ => None,
        }
    }

    fn veroeffentlichen(
        &mut self,
        ereignisse: &[Ereignis],
        jetzt: DateTime<Utc>,
    ) -> Vec<AusgehenderBefehl> {
        let mut ausgang = Vec::new();
        {
            let mut ctx = Kontext::neu(
                &self.dispatcher,
                &mut self.presence,
                &mut ausgang,
                jetzt,
                &self.eigener_nick,
            );
            for ereignis in ereignisse {
                let zustellung = match ereignis {
                    Ereignis::Befehl { quelle, ziel, argv } => self
                        .dispatcher
                        .befehl_veroeffentlichen(quelle, ziel, argv.clone(), &mut ctx),
                    _ => self.dispatcher.ereignis_veroeffentlichen(ereignis, &mut ctx),
                };
                if let Some(m) = &self.metriken {
                    let art = match ereignis {
                        Ereignis::Befehl { .. } => "befehl".to_string(),
                        _ => ereignis.schluessel().to_string(),
                    };
                    m.ereignisse_total.with_label_values(&[&art]).inc();
                    m.handler_fehler_total
                        .inc_by(zustellung.fehlgeschlagen as u64);
                }
            }
        }
        self.geplant.extend(self.dispatcher.geplante_entnehmen());
        self.metriken_nachziehen();
        ausgang
    }

    fn metriken_nachziehen(&mut self) {
        let fehler = self.waechter.borrow().log_schreibfehler();
        if let Some(m) = &self.metriken {
            m.log_schreibfehler_total
                .inc_by(fehler.saturating_sub(self.log_fehler_gezaehlt));
            m.teilnehmer.set(self.presence.anzahl() as i64);
        }
        self.log_fehler_gezaehlt = fehler;
    }

    // -----------------------------------------------------------------------
    // Schleife
    // -----------------------------------------------------------------------

    /// Gibt den Ausgangspuffer an den Transport
    ///
    /// Ein fehlgeschlagener Befehl wird protokolliert; die Schleife laeuft weiter.
    pub fn ausliefern<T: Transport>(&mut self, transport: &mut T, ausgang: Vec<AusgehenderBefehl>) {
        for befehl in ausgang {
            if let Some(m) = &self.metriken {
                let modus = match &befehl {
                    AusgehenderBefehl::Modus { modus, .. } => Some(modus.as_str()),
                    _ => None,
                };
                m.befehl_gesendet(befehl.art(), modus);
            }
            if matches!(befehl, AusgehenderBefehl::Beenden { .. }) {
                self.beenden_angefordert = true;
            }
            if let Err(e) = transport.ausfuehren(&befehl) {
                error!(art = befehl.art(), fehler = %e, "Befehl konnte nicht gesendet werden");
            }
        }
    }

    /// Startet fuer jede geplante Ausfuehrung einen Timer
    fn timer_starten(&mut self) {
        for aufruf in self.geplante_nehmen() {
            let tx = self.timer_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(aufruf.verzoegerung).await;
                // Empfaenger lebt so lange wie der Bot
                let _ = tx.send(aufruf);
            });
        }
    }

    /// Eine Verbindung von Aufbau bis Trennung
    pub async fn sitzung<T: Transport>(&mut self, transport: &mut T) -> anyhow::Result<Sitzungsende> {
        let mut eingang = transport.verbinden().await?;
        if let Some(m) = &self.metriken {
            m.verbindungen_total.inc();
        }

        loop {
            let naechstes = tokio::select! {
                e = eingang.recv() => Eingang::Transport(e),
                Some(aufruf) = self.timer_rx.recv() => Eingang::Timer(aufruf),
            };

            let ausgang = match naechstes {
                Eingang::Transport(None) => {
                    self.verarbeiten(
                        TransportEreignis::Getrennt {
                            grund: "Ereignis-Strom beendet".into(),
                        },
                        Utc::now(),
                    );
                    return Ok(self.ende("Ereignis-Strom beendet".into()));
                }
                Eingang::Transport(Some(TransportEreignis::Getrennt { grund })) => {
                    self.verarbeiten(
                        TransportEreignis::Getrennt {
                            grund: grund.clone(),
                        },
                        Utc::now(),
                    );
                    return Ok(self.ende(grund));
                }
                Eingang::Transport(Some(e)) => self.verarbeiten(e, Utc::now()),
                Eingang::Timer(aufruf) => self.verzoegert_ausfuehren(aufruf, Utc::now()),
            };
            self.ausliefern(transport, ausgang);
            self.timer_starten();

            if self.beenden_angefordert {
                // Auf die Trennung durch den Server warten, aber nicht ewig
                let _ = tokio::time::timeout(QUIT_FRIST, async {
                    while let Some(e) = eingang.recv().await {
                        if matches!(e, TransportEreignis::Getrennt { .. }) {
                            break;
                        }
                    }
                })
                .await;
                self.health.verbindung_setzen(false);
                return Ok(Sitzungsende::Beendet);
            }
        }
    }

    fn ende(&self, grund: String) -> Sitzungsende {
        if self.beenden_angefordert {
            Sitzungsende::Beendet
        } else {
            Sitzungsende::Getrennt(grund)
        }
    }
}
