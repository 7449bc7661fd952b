//! Eingebaute Erweiterungen des Bots: Kern und Quit

use shirk_core::event::AusgehenderBefehl;
use shirk_dispatch::{Ereignis, EreignisArt, Erweiterung, Kontext, Routentabelle};
use tracing::info;

// ---------------------------------------------------------------------------
// Kern
// ---------------------------------------------------------------------------

/// Raeume betreten, Mitglieder erfragen, Befehle und Erweiterungen auflisten
pub struct KernErweiterung {
    raeume: Vec<String>,
}

impl KernErweiterung {
    pub fn neu(raeume: Vec<String>) -> Self {
        Self { raeume }
    }

    fn angemeldet(&mut self, _: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        for raum in &self.raeume {
            info!(raum = %raum, "Betrete Raum");
            ctx.senden(AusgehenderBefehl::Beitreten { raum: raum.clone() });
        }
        Ok(())
    }

    /// Nach dem eigenen Beitritt die vorhandenen Mitglieder per WHO erfragen
    fn beigetreten(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Beigetreten { name, raum } = e else {
            return Ok(());
        };
        if ctx.ist_selbst(name) {
            ctx.senden(AusgehenderBefehl::Roh {
                zeile: format!("WHO {raum}"),
            });
        }
        Ok(())
    }

    fn cmd_commands(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, .. } = e else {
            return Ok(());
        };
        let liste = ctx.dispatcher.befehle().join(", ");
        ctx.antworten(quelle, ziel, liste);
        Ok(())
    }

    fn cmd_plugs(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, ziel, .. } = e else {
            return Ok(());
        };
        let liste = ctx.dispatcher.erweiterungen().join(", ");
        ctx.antworten(quelle, ziel, liste);
        Ok(())
    }
}

impl Erweiterung for KernErweiterung {
    fn name(&self) -> &'static str {
        "Core"
    }

    fn routen() -> Routentabelle<Self> {
        Routentabelle::neu()
            .ereignis(EreignisArt::Angemeldet, Self::angemeldet)
            .ereignis(EreignisArt::Beigetreten, Self::beigetreten)
            .befehl("commands", Self::cmd_commands)
            .befehl("plugs", Self::cmd_plugs)
    }
}

// ---------------------------------------------------------------------------
// Quit
// ---------------------------------------------------------------------------

/// `!quit` faehrt den Bot herunter; `<nick>: enable|disable` schaltet das ab
pub struct QuitErweiterung {
    stufe: u32,
    aktiviert: bool,
}

impl QuitErweiterung {
    pub fn neu(stufe: u32) -> Self {
        Self {
            stufe,
            aktiviert: true,
        }
    }

    fn angesprochen(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Angesprochen { quelle, text, .. } = e else {
            return Ok(());
        };
        if ctx.macht(quelle) < self.stufe {
            return Ok(());
        }
        if text.starts_with("enable") {
            self.aktiviert = true;
            info!(quelle = %quelle, "!quit aktiviert");
        } else if text.starts_with("disable") {
            self.aktiviert = false;
            info!(quelle = %quelle, "!quit deaktiviert");
        }
        Ok(())
    }

    fn cmd_quit(&mut self, e: &Ereignis, ctx: &mut Kontext<'_>) -> anyhow::Result<()> {
        let Ereignis::Befehl { quelle, .. } = e else {
            return Ok(());
        };
        if !self.aktiviert || ctx.macht(quelle) < self.stufe {
            return Ok(());
        }
        info!(quelle = %quelle, "Herunterfahren angefordert");
        ctx.senden(AusgehenderBefehl::Beenden {
            nachricht: format!("Requested by {quelle}"),
        });
        Ok(())
    }
}

impl Erweiterung for QuitErweiterung {
    fn name(&self) -> &'static str {
        "Quit"
    }

    fn routen() -> Routentabelle<Self> {
        Routentabelle::neu()
            .ereignis(EreignisArt::Angesprochen, Self::angesprochen)
            .befehl("quit", Self::cmd_quit)
    }
}
