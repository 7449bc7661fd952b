//! Auth-Erweiterung
//!
//! Setzt die Berechtigungsstufe (`macht`) an Teilnehmern der
//! Presence-Registry. Andere Erweiterungen lesen sie ueber
//! [`Kontext::macht`](shirk_dispatch::Kontext::macht).

use std::collections::HashMap;

use tracing::info;

use shirk_core::event::AusgehenderBefehl;
use shirk_dispatch::{Ereignis, EreignisArt, Erweiterung, Kontext, Routentabelle};

use crate::config::AuthKonfig;

/// Numerische Antwort "is logged in as" im WHOIS
const RPL_WHOISACCOUNT: u16 = 330;

/// Erweiterung fuer Berechtigungsstufen
pub struct AuthErweiterung {
    konfig: AuthKonfig,
    /// Offene `!auth`-Anfragen: Nick -> Ziel fuer die Antwort
    manuell: HashMap<String, String>,
}

impl AuthErweiterung {
    pub fn neu(konfig: AuthKonfig) -> Self {
        Self {
            konfig,
            manuell: HashMap::new(),
        }
    }

    /// Prueft einen Teilnehmer neu: Hostmaske sofort, Konto per WHOIS
    fn pruefen(&mut self, name: &str, ctx: &mut Kontext<'_>) {
        let Some(teilnehmer) = ctx.presence.per_name(name) else {
            return;
        };
        let identitaet = {
            let mut t = teilnehmer.borrow_mut();
            t.macht = 0;
            t.auth_methode = None;
            t.identitaet.clone()
        };

        let mut gefunden = false;
        if let Some((stufe, maske)) = self.konfig.host_stufe(identitaet.as_str()) {
            gefunden = true;
            let maske = maske.to_string();
            self.aufwerten(name, stufe, "hostmask", &maske, ctx);
        }
        if self.konfig.ist_bekannter_nick(name) {
            gefunden = true;
            ctx.senden(AusgehenderBefehl::Roh {
                zeile: format!("WHOIS {name}"),
            });
        }
        if !gefunden {
            if let Some(ziel) = self.manuell.remove(name) {
                info!(name, "Authentifizierung fehlgeschlagen – nicht konfiguriert");
                ctx.antworten(
                    name,
                    &ziel,
                    format!("{name} is not in the auth file.  This incident will be reported."),
                );
            }
        }
    }

    fn aufwerten(
        &mut self,
        name: &str,
        stufe: u32,
        methode: &str,
        treffer: &str,
        ctx: &mut Kontext<'_>,
    ) {
        let Some(teilnehmer) = ctx.presence.per_name(name) else {
            return;
        };
        {
            let mut t = teilnehmer.borrow_mut();
            t.macht = stufe;
            t.auth_methode = Some(methode.to_string());
        }
        if let Some(ziel) = self.manuell.remove(name) {
            ctx.antworten(name, &ziel, format!("Successfully authenticated {name}"));
        }
        info!(name, stufe, methode, treffer, "Berechtigungsstufe gesetzt");
    }

    fn teilnehmer_erstellt(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::TeilnehmerErstellt { id } = e else {
            return Ok(());
        };
        let Some(name) = ctx.presence.per_id(*id).map(|t| t.borrow().name.clone()) else {
            return Ok(());
        };
        self.pruefen(&name, ctx);
        Ok(())
    }

    fn teilnehmer_umbenannt(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::TeilnehmerUmbenannt { id, .. } = e else {
            return Ok(());
        };
        let Some(name) = ctx.presence.per_id(*id).map(|t| t.borrow().name.clone()) else {
            return Ok(());
        };
        if self.konfig.ist_bekannter_nick(&name) {
            ctx.senden(AusgehenderBefehl::Roh {
                zeile: format!("WHOIS {name}"),
            });
        }
        Ok(())
    }

    /// `<ich> <nick> <konto> :is logged in as`
    fn eingeloggt_als(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Roh { parameter, .. } = e else {
            return Ok(());
        };
        let (Some(nick), Some(konto)) = (parameter.get(1), parameter.get(2)) else {
            anyhow::bail!("330 ohne Nick und Konto: {parameter:?}");
        };
        if let Some(stufe) = self.konfig.konten.get(konto).copied() {
            self.aufwerten(nick, stufe, "NickServ", konto, ctx);
        }
        Ok(())
    }

    fn cmd_auth(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, .. } = e else {
            return Ok(());
        };
        if ctx.presence.per_name(quelle).is_some() {
            self.manuell.insert(quelle.clone(), ziel.clone());
            self.pruefen(quelle, ctx);
        }
        Ok(())
    }

    fn cmd_whoami(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, .. } = e else {
            return Ok(());
        };
        let status = ctx.presence.per_name(quelle).and_then(|t| {
            let t = t.borrow();
            (t.macht > 0).then(|| (t.macht, t.auth_methode.clone().unwrap_or_default()))
        });
        let text = match status {
            Some((macht, methode)) => {
                format!("{quelle}: You are authenticated ({methode}) and have power {macht}")
            }
            None => format!("{quelle}: You are powerless."),
        };
        ctx.antworten(quelle, ziel, text);
        Ok(())
    }
}

impl Erweiterung for AuthErweiterung {
    fn name(&self) -> &'static str {
        "Auth"
    }

    fn routen() -> Routentabelle<Self> {
        Routentabelle::neu()
            .ereignis(EreignisArt::TeilnehmerErstellt, Self::teilnehmer_erstellt)
            .ereignis(EreignisArt::TeilnehmerUmbenannt, Self::teilnehmer_umbenannt)
            .ereignis(EreignisArt::Roh(RPL_WHOISACCOUNT), Self::eingeloggt_als)
            .befehl("auth", Self::cmd_auth)
            .befehl("whoami", Self::cmd_whoami)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
