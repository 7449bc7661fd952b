//! shirk-bot – Bibliotheks-Root
//!
//! Deklariert alle Bot-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod erweiterungen;
pub mod irc;
pub mod laufzeit;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use config::BotConfig;
use irc::IrcTransport;
use laufzeit::{Bot, Sitzungsende};
use shirk_observability::{observability_server_starten, HealthState, ShirkMetrics};

/// Pause vor dem Neuverbinden nach einer abgebrochenen Sitzung
const PAUSE_NACH_TRENNUNG: Duration = Duration::from_secs(5);

/// Startet den Bot und laeuft bis `!quit` oder Ctrl-C
///
/// Reihenfolge:
/// 1. Observability-Server starten (falls aktiviert)
/// 2. Erweiterungen registrieren, Wiederherstellungs-Log laden
/// 3. Verbinden; nach Verbindungsverlust erneut verbinden
pub async fn starten(config: BotConfig) -> Result<()> {
    let mut bot = Bot::neu(&config);

    if config.observability.aktiviert {
        let adresse: SocketAddr = config
            .observability_bind_adresse()
            .parse()
            .context("Ungueltige Observability-Adresse")?;
        let metriken = ShirkMetrics::neu().context("Metriken konnten nicht angelegt werden")?;
        let health = HealthState::neu();
        bot = bot.mit_observability(metriken.clone(), health.clone());
        tokio::spawn(async move {
            if let Err(e) = observability_server_starten(adresse, metriken, health).await {
                tracing::error!(fehler = %e, "Observability-Server beendet");
            }
        });
    }

    let schleife = async {
        loop {
            let mut transport = IrcTransport::neu(config.verbindung.clone());
            match bot.sitzung(&mut transport).await {
                Ok(Sitzungsende::Beendet) => {
                    tracing::info!("Bot beendet");
                    return;
                }
                Ok(Sitzungsende::Getrennt(grund)) => {
                    tracing::info!(grund = %grund, "Verbindung verloren – verbinde neu");
                    tokio::time::sleep(PAUSE_NACH_TRENNUNG).await;
                }
                Err(e) => {
                    tracing::error!(
                        server = %config.server_adresse(),
                        fehler = %e,
                        warte_sek = config.verbindung.wiederverbindung_sek,
                        "Verbindung fehlgeschlagen"
                    );
                    tokio::time::sleep(config.wiederverbindung()).await;
                }
            }
        }
    };

    tokio::select! {
        _ = schleife => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutdown-Signal empfangen, Bot wird beendet");
        }
    }
    Ok(())
}
