//! Pruefstand fuer die Integrationstests des Waechters

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use shirk_core::event::AusgehenderBefehl;
use shirk_core::types::SekundaereIdentitaet;
use shirk_dispatch::{Dispatcher, Ereignis, Kontext, VerzoegerterAufruf, Zustellung};
use shirk_guard::{WaechterErweiterung, WaechterKonfig, SCAN};
use shirk_presence::{BeitrittsErgebnis, PresenceRegistry};

pub const BOT: &str = "shirk";
pub const RAUM: &str = "#chat";

pub struct Pruefstand {
    pub dispatcher: Dispatcher,
    pub presence: PresenceRegistry,
    pub ausgang: Vec<AusgehenderBefehl>,
    pub jetzt: DateTime<Utc>,
    pub waechter: Rc<RefCell<WaechterErweiterung>>,
    pub geplant: Vec<VerzoegerterAufruf>,
    pub log_pfad: PathBuf,
}

impl Pruefstand {
    /// Waechter mit Log in `verzeichnis`; `anpassen` aendert die Konfiguration
    pub fn neu(verzeichnis: &Path, anpassen: impl FnOnce(&mut WaechterKonfig)) -> Self {
        let mut konfig = WaechterKonfig {
            log_pfad: verzeichnis.join("recover.json"),
            ..WaechterKonfig::default()
        };
        anpassen(&mut konfig);
        let log_pfad = konfig.log_pfad.clone();

        let dispatcher = Dispatcher::neu();
        let waechter = WaechterErweiterung::neu(konfig, vec![RAUM.to_string()]).anmelden(&dispatcher);

        Self {
            dispatcher,
            presence: PresenceRegistry::neu(),
            ausgang: Vec::new(),
            jetzt: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            waechter,
            geplant: Vec::new(),
            log_pfad,
        }
    }

    pub fn senden(&mut self, ereignis: Ereignis) -> Zustellung {
        let mut ctx = Kontext::neu(
            &self.dispatcher,
            &mut self.presence,
            &mut self.ausgang,
            self.jetzt,
            BOT,
        );
        let zustellung = self.dispatcher.ereignis_veroeffentlichen(&ereignis, &mut ctx);
        self.geplant.extend(self.dispatcher.geplante_entnehmen());
        assert_eq!(zustellung.fehlgeschlagen, 0, "Handler fehlgeschlagen fuer {ereignis:?}");
        zustellung
    }

    pub fn ausgang_nehmen(&mut self) -> Vec<AusgehenderBefehl> {
        std::mem::take(&mut self.ausgang)
    }

    pub fn geplant_nehmen(&mut self) -> Vec<VerzoegerterAufruf> {
        std::mem::take(&mut self.geplant)
    }

    pub fn vorspulen(&mut self, sekunden: i64) {
        self.jetzt += Duration::seconds(sekunden);
    }

    /// Teilnehmer betritt den Raum (Registry zuerst, dann Ereignis)
    pub fn beitreten(&mut self, name: &str, host: &str) {
        let ergebnis = self.presence.beigetreten(
            name,
            SekundaereIdentitaet::aus_benutzer_host(name, host),
            RAUM,
        );
        if let BeitrittsErgebnis::Erstellt(t) = &ergebnis {
            let id = t.borrow().id;
            self.senden(Ereignis::TeilnehmerErstellt { id });
        }
        self.senden(Ereignis::Beigetreten {
            name: name.into(),
            raum: RAUM.into(),
        });
    }

    pub fn bot_betritt(&mut self) {
        self.senden(Ereignis::Angemeldet);
        self.beitreten(BOT, "bot.example");
    }

    pub fn macht_setzen(&mut self, name: &str, macht: u32) {
        if let Some(t) = self.presence.per_name(name) {
            t.borrow_mut().macht = macht;
        }
    }

    pub fn befehl(&mut self, quelle: &str, argv: &[&str]) {
        self.senden(Ereignis::Befehl {
            quelle: quelle.into(),
            ziel: RAUM.into(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub fn modus(&mut self, quelle: &str, plus: bool, modus: char, argument: &str) {
        self.senden(Ereignis::Modus {
            quelle: quelle.into(),
            raum: RAUM.into(),
            hinzugefuegt: plus,
            modus,
            argumente: vec![argument.into()],
        });
    }

    pub fn op_erhalten(&mut self) {
        self.modus("ChanServ", true, 'o', BOT);
    }

    pub fn ban_bestaetigen(&mut self, maske: &str) {
        self.modus(BOT, true, 'b', maske);
    }

    pub fn scan(&mut self) {
        self.senden(Ereignis::Verzoegert {
            art: SCAN.into(),
            parameter: Vec::new(),
        });
    }

    pub fn gebannt_im_raum(&mut self) -> Zustellung {
        self.senden(Ereignis::Roh {
            code: 474,
            parameter: vec![BOT.into(), RAUM.into(), "Cannot join channel (+b)".into()],
        })
    }

    /// Privileg gehalten genau dann, wenn Arbeit ansteht
    pub fn konvergiert(&self) -> bool {
        let w = self.waechter.borrow();
        w.hat_privileg(RAUM) == w.arbeit_vorhanden(RAUM)
    }

    pub fn log_inhalt(&self) -> String {
        std::fs::read_to_string(&self.log_pfad).unwrap_or_default()
    }
}

pub fn identitaet(wert: &str) -> SekundaereIdentitaet {
    SekundaereIdentitaet::neu(wert)
}

pub fn nachricht(text: &str) -> AusgehenderBefehl {
    AusgehenderBefehl::Nachricht {
        ziel: RAUM.into(),
        text: text.into(),
    }
}

pub fn roh(zeile: &str) -> AusgehenderBefehl {
    AusgehenderBefehl::Roh { zeile: zeile.into() }
}

pub fn modus_befehl(modus: &str) -> AusgehenderBefehl {
    AusgehenderBefehl::Modus {
        raum: RAUM.into(),
        modus: modus.into(),
    }
}
