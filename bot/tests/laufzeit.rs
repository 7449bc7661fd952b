//! Integration-Tests fuer die Event-Schleife: Normalisierung, Registry, Sitzung

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use shirk_bot::config::BotConfig;
use shirk_bot::laufzeit::{Bot, Sitzungsende};
use shirk_core::error::{Result, ShirkError};
use shirk_core::event::{AusgehenderBefehl, TransportEreignis};
use shirk_core::transport::Transport;
use shirk_guard::SCAN;

const RAUM: &str = "#chat";

fn jetzt() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn config(dir: &std::path::Path) -> BotConfig {
    let mut config = BotConfig::default();
    config.bot.raeume = vec![RAUM.into()];
    config.waechter.log_pfad = dir.join("recover.json");
    config.auth.hosts = HashMap::from([("o.example".to_string(), 12)]);
    config
}

fn beigetreten(name: &str, host: &str) -> TransportEreignis {
    TransportEreignis::Beigetreten {
        name: name.into(),
        benutzer: name.into(),
        host: host.into(),
        raum: RAUM.into(),
    }
}

fn sagt(quelle: &str, ziel: &str, text: &str) -> TransportEreignis {
    TransportEreignis::Nachricht {
        quelle: quelle.into(),
        ziel: ziel.into(),
        text: text.into(),
        ist_aktion: false,
    }
}

fn modus(quelle: &str, plus: bool, m: char, arg: &str) -> TransportEreignis {
    TransportEreignis::ModusGeaendert {
        quelle: quelle.into(),
        raum: RAUM.into(),
        hinzugefuegt: plus,
        modus: m,
        argumente: vec![arg.into()],
    }
}

fn nachricht(ziel: &str, text: &str) -> AusgehenderBefehl {
    AusgehenderBefehl::Nachricht {
        ziel: ziel.into(),
        text: text.into(),
    }
}

/// Bot nach Anmeldung im Raum, mit `op` (Stufe 12) und `alice`
fn im_raum(bot: &mut Bot) {
    bot.verarbeiten(TransportEreignis::Angemeldet, jetzt());
    bot.verarbeiten(beigetreten("shirk", "bot.example"), jetzt());
    bot.verarbeiten(beigetreten("op", "o.example"), jetzt());
    bot.verarbeiten(beigetreten("alice", "a.example"), jetzt());
    bot.geplante_nehmen();
}

#[test]
fn anmeldung_betritt_raeume_und_plant_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));

    let ausgang = bot.verarbeiten(TransportEreignis::Angemeldet, jetzt());
    assert_eq!(
        ausgang,
        vec![AusgehenderBefehl::Beitreten { raum: RAUM.into() }]
    );
    let geplant = bot.geplante_nehmen();
    assert_eq!(geplant.len(), 1);
    assert_eq!(geplant[0].art, SCAN);

    // Eigener Beitritt: WHO, danach Mitglieder aus der Antwort
    let ausgang = bot.verarbeiten(beigetreten("shirk", "bot.example"), jetzt());
    assert_eq!(
        ausgang,
        vec![AusgehenderBefehl::Roh {
            zeile: format!("WHO {RAUM}")
        }]
    );
    bot.verarbeiten(
        TransportEreignis::Numerisch {
            code: 352,
            parameter: ["shirk", RAUM, "al", "a.example", "srv", "alice", "H", "0 Alice"]
                .map(String::from)
                .to_vec(),
        },
        jetzt(),
    );
    let alice = bot.presence().per_name("alice").unwrap();
    assert_eq!(alice.borrow().identitaet.as_str(), "al@a.example");
}

#[test]
fn befehle_privat_und_im_raum() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    im_raum(&mut bot);

    assert_eq!(
        bot.verarbeiten(sagt("alice", RAUM, "!whoami"), jetzt()),
        vec![nachricht(RAUM, "alice: You are powerless.")]
    );
    // Privat: Antwort an den Absender
    assert_eq!(
        bot.verarbeiten(sagt("op", "shirk", "!whoami"), jetzt()),
        vec![nachricht(
            "op",
            "op: You are authenticated (hostmask) and have power 12"
        )]
    );
    // Nur das Praefix ist kein Befehl, unbekannte Befehle bleiben stumm
    assert!(bot.verarbeiten(sagt("alice", RAUM, "!"), jetzt()).is_empty());
    assert!(bot.verarbeiten(sagt("alice", RAUM, "!gibtsnicht"), jetzt()).is_empty());
}

#[test]
fn ansprache_schaltet_quit() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    im_raum(&mut bot);

    bot.verarbeiten(sagt("op", RAUM, "Shirk, disable"), jetzt());
    assert!(bot.verarbeiten(sagt("op", RAUM, "!quit"), jetzt()).is_empty());

    bot.verarbeiten(sagt("op", RAUM, "shirk: enable"), jetzt());
    assert_eq!(
        bot.verarbeiten(sagt("op", RAUM, "!quit"), jetzt()),
        vec![AusgehenderBefehl::Beenden {
            nachricht: "Requested by op".into()
        }]
    );
}

#[test]
fn registry_folgt_transport() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    im_raum(&mut bot);

    bot.verarbeiten(
        TransportEreignis::Umbenannt {
            alt: "alice".into(),
            neu: "alice_".into(),
        },
        jetzt(),
    );
    assert!(bot.presence().per_name("alice").is_none());
    assert!(bot.presence().per_name("alice_").is_some());

    bot.verarbeiten(
        TransportEreignis::Beendet {
            name: "alice_".into(),
        },
        jetzt(),
    );
    assert!(bot.presence().per_name("alice_").is_none());

    // Bot verlaesst den Raum: alle Eintraege des Raums verschwinden
    bot.verarbeiten(
        TransportEreignis::Verlassen {
            name: "shirk".into(),
            raum: RAUM.into(),
        },
        jetzt(),
    );
    assert_eq!(bot.presence().anzahl(), 0);
}

#[test]
fn knockout_ueber_den_transport() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    im_raum(&mut bot);

    assert_eq!(
        bot.verarbeiten(sagt("alice", RAUM, "!register jetzt"), jetzt()),
        vec![
            nachricht(RAUM, "alice: Please wait, processing your request."),
            AusgehenderBefehl::Roh {
                zeile: "CHANSERV OP #chat".into()
            },
        ]
    );
    assert_eq!(
        bot.verarbeiten(modus("ChanServ", true, 'o', "shirk"), jetzt()),
        vec![AusgehenderBefehl::Modus {
            raum: RAUM.into(),
            modus: "+b *!alice@a.example".into()
        }]
    );
    assert_eq!(
        bot.verarbeiten(modus("shirk", true, 'b', "*!alice@a.example"), jetzt()),
        vec![AusgehenderBefehl::Kick {
            raum: RAUM.into(),
            name: "alice".into(),
            grund: "Your behaviour is not appreciated here.".into(),
        }]
    );

    // Kick kommt vom Server zurueck
    bot.verarbeiten(
        TransportEreignis::Gekickt {
            raum: RAUM.into(),
            name: "alice".into(),
            kicker: "shirk".into(),
            grund: "Your behaviour is not appreciated here.".into(),
        },
        jetzt(),
    );
    assert!(bot.presence().per_name("alice").is_none());
    assert_eq!(bot.waechter().borrow().wiederherstellungen().len(), 1);
}

#[test]
fn eigener_kick_plant_sofortigen_rejoin() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    im_raum(&mut bot);

    bot.verarbeiten(
        TransportEreignis::Gekickt {
            raum: RAUM.into(),
            name: "shirk".into(),
            kicker: "op".into(),
            grund: "test".into(),
        },
        jetzt(),
    );
    let geplant = bot.geplante_nehmen();
    assert_eq!(geplant.len(), 1);
    assert_eq!(geplant[0].verzoegerung, std::time::Duration::ZERO);

    let ausgang = bot.verzoegert_ausfuehren(geplant.into_iter().next().unwrap(), jetzt());
    assert_eq!(
        ausgang,
        vec![AusgehenderBefehl::Beitreten { raum: RAUM.into() }]
    );
}

#[test]
fn vergebener_nick_weicht_aus() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));

    let ausgang = bot.verarbeiten(
        TransportEreignis::Numerisch {
            code: 433,
            parameter: vec!["*".into(), "shirk".into(), "Nickname is already in use".into()],
        },
        jetzt(),
    );
    assert_eq!(
        ausgang,
        vec![AusgehenderBefehl::Roh {
            zeile: "NICK shirk_".into()
        }]
    );
    assert_eq!(bot.eigener_nick(), "shirk_");
}

// ---------------------------------------------------------------------------
// Sitzung mit Transport-Attrappe
// ---------------------------------------------------------------------------

struct Attrappe {
    eingang: Option<mpsc::Receiver<TransportEreignis>>,
    gesendet: Vec<AusgehenderBefehl>,
}

impl Attrappe {
    fn neu(ereignisse: Vec<TransportEreignis>) -> Self {
        let (tx, rx) = mpsc::channel(ereignisse.len().max(1));
        for e in ereignisse {
            tx.try_send(e).unwrap();
        }
        Self {
            eingang: Some(rx),
            gesendet: Vec::new(),
        }
    }
}

impl Transport for Attrappe {
    async fn verbinden(&mut self) -> Result<mpsc::Receiver<TransportEreignis>> {
        self.eingang
            .take()
            .ok_or_else(|| ShirkError::Verbindung("bereits verbunden".into()))
    }

    fn beitreten(&mut self, _: &str) -> Result<()> {
        Ok(())
    }

    fn roh_senden(&mut self, _: &str) -> Result<()> {
        Ok(())
    }

    fn kick_anfordern(&mut self, _: &str, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn modus_aendern(&mut self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn nachricht_senden(&mut self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn beenden(&mut self, _: &str) -> Result<()> {
        Ok(())
    }

    fn ausfuehren(&mut self, befehl: &AusgehenderBefehl) -> Result<()> {
        self.gesendet.push(befehl.clone());
        Ok(())
    }
}

#[tokio::test]
async fn sitzung_endet_mit_quit() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    let mut transport = Attrappe::neu(vec![
        TransportEreignis::Angemeldet,
        beigetreten("shirk", "bot.example"),
        beigetreten("op", "o.example"),
        sagt("op", RAUM, "!quit"),
        TransportEreignis::Getrennt {
            grund: "Quit".into(),
        },
    ]);

    let ende = bot.sitzung(&mut transport).await.unwrap();
    assert_eq!(ende, Sitzungsende::Beendet);
    assert!(bot.beenden_angefordert());
    assert_eq!(
        transport.gesendet.first(),
        Some(&AusgehenderBefehl::Beitreten { raum: RAUM.into() })
    );
    assert_eq!(
        transport.gesendet.last(),
        Some(&AusgehenderBefehl::Beenden {
            nachricht: "Requested by op".into()
        })
    );
}

#[tokio::test]
async fn sitzung_meldet_trennung() {
    let dir = tempfile::tempdir().unwrap();
    let mut bot = Bot::neu(&config(dir.path()));
    let mut transport = Attrappe::neu(vec![
        TransportEreignis::Angemeldet,
        beigetreten("shirk", "bot.example"),
        TransportEreignis::Getrennt {
            grund: "Ping timeout".into(),
        },
    ]);

    let ende = bot.sitzung(&mut transport).await.unwrap();
    assert_eq!(ende, Sitzungsende::Getrennt("Ping timeout".into()));
    assert_eq!(bot.presence().anzahl(), 0);

    // Zweiter Versuch mit verbrauchter Attrappe schlaegt fehl
    assert!(bot.sitzung(&mut transport).await.is_err());
}
