//! Prometheus-kompatible Metriken fuer Shirk
//!
//! Registrierte Metriken:
//! - `shirk_ereignisse_total` – Counter: Veroeffentlichte Ereignisse (art)
//! - `shirk_handler_fehler_total` – Counter: Fehlgeschlagene Handler-Aufrufe
//! - `shirk_befehle_gesendet_total` – Counter: Ausgehende Befehle (art)
//! - `shirk_bans_total` – Counter: Gesendete Bans
//! - `shirk_unbans_total` – Counter: Gesendete Ban-Aufhebungen
//! - `shirk_kicks_total` – Counter: Gesendete Kicks
//! - `shirk_beitritte_total` – Counter: Beitritts-Versuche (inkl. Rejoin)
//! - `shirk_log_schreibfehler_total` – Counter: Fehlgeschlagene Log-Schreibvorgaenge
//! - `shirk_verbindungen_total` – Counter: Aufgebaute Verbindungen
//! - `shirk_teilnehmer` – Gauge: Bekannte Teilnehmer

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Shirk-Prometheus-Metriken
#[derive(Clone)]
pub struct ShirkMetrics {
    pub registry: Arc<Registry>,

    // Dispatch
    pub ereignisse_total: IntCounterVec,
    pub handler_fehler_total: IntCounter,

    // Ausgang
    pub befehle_gesendet_total: IntCounterVec,
    pub bans_total: IntCounter,
    pub unbans_total: IntCounter,
    pub kicks_total: IntCounter,
    pub beitritte_total: IntCounter,

    // Laufzeit
    pub log_schreibfehler_total: IntCounter,
    pub verbindungen_total: IntCounter,
    pub teilnehmer: IntGauge,
}

fn zaehler(registry: &Registry, name: &str, hilfe: &str) -> Result<IntCounter> {
    let c = IntCounter::with_opts(Opts::new(name, hilfe))?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl ShirkMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let ereignisse_total = IntCounterVec::new(
            Opts::new("shirk_ereignisse_total", "Veroeffentlichte Ereignisse"),
            &["art"],
        )?;
        registry.register(Box::new(ereignisse_total.clone()))?;

        let handler_fehler_total = zaehler(
            &registry,
            "shirk_handler_fehler_total",
            "Fehlgeschlagene Handler-Aufrufe",
        )?;

        let befehle_gesendet_total = IntCounterVec::new(
            Opts::new("shirk_befehle_gesendet_total", "Ausgehende Befehle"),
            &["art"],
        )?;
        registry.register(Box::new(befehle_gesendet_total.clone()))?;

        let bans_total = zaehler(&registry, "shirk_bans_total", "Gesendete Bans")?;
        let unbans_total = zaehler(
            &registry,
            "shirk_unbans_total",
            "Gesendete Ban-Aufhebungen",
        )?;
        let kicks_total = zaehler(&registry, "shirk_kicks_total", "Gesendete Kicks")?;
        let beitritte_total = zaehler(
            &registry,
            "shirk_beitritte_total",
            "Beitritts-Versuche inkl. Rejoin",
        )?;
        let log_schreibfehler_total = zaehler(
            &registry,
            "shirk_log_schreibfehler_total",
            "Fehlgeschlagene Schreibvorgaenge des Wiederherstellungs-Logs",
        )?;
        let verbindungen_total = zaehler(
            &registry,
            "shirk_verbindungen_total",
            "Aufgebaute Verbindungen zum Chat-Netzwerk",
        )?;

        let teilnehmer = IntGauge::with_opts(Opts::new(
            "shirk_teilnehmer",
            "Anzahl bekannter Teilnehmer",
        ))?;
        registry.register(Box::new(teilnehmer.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            ereignisse_total,
            handler_fehler_total,
            befehle_gesendet_total,
            bans_total,
            unbans_total,
            kicks_total,
            beitritte_total,
            log_schreibfehler_total,
            verbindungen_total,
            teilnehmer,
        })
    }

    /// Zaehlt einen ausgehenden Befehl.
    ///
    /// `modus` ist die Modus-Zeichenkette bei Modus-Befehlen (z.B. `+b *!u@h`).
    pub fn befehl_gesendet(&self, art: &str, modus: Option<&str>) {
        self.befehle_gesendet_total.with_label_values(&[art]).inc();
        match (art, modus) {
            ("kick", _) => self.kicks_total.inc(),
            ("beitreten", _) => self.beitritte_total.inc(),
            (_, Some(m)) if m.starts_with("+b") => self.bans_total.inc(),
            (_, Some(m)) if m.starts_with("-b") => self.unbans_total.inc(),
            _ => {}
        }
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: ShirkMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<ShirkMetrics>,
) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
