//! Prometheus-kompatible Metriken fuer Duett
//!
//! Registrierte Metriken:
//! - `duett_connected_peers` – Gauge: Aktuell verbundene Peers
//! - `duett_waiting_peers` – Gauge: Peers im Warteplatz (0 oder 1)
//! - `duett_active_rooms` – Gauge: Aktive Raeume
//! - `duett_matches_total` – Counter: Erfolgreiche Paarungen
//! - `duett_relayed_events_total` – Counter: Weitergeleitete Events (kind)
//! - `duett_dropped_events_total` – Counter: Verworfene Events (kind)
//! - `duett_invalid_frames_total` – Counter: Nicht dekodierbare Frames

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Duett-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Zaehler.
#[derive(Clone)]
pub struct DuettMetriken {
    pub registry: Arc<Registry>,

    // Zustand der Vermittlung
    pub verbundene_peers: IntGauge,
    pub wartende_peers: IntGauge,
    pub aktive_raeume: IntGauge,

    // Ereignisse
    pub paarungen_total: IntCounter,
    pub weitergeleitet_total: IntCounterVec,
    pub verworfen_total: IntCounterVec,
    pub ungueltige_frames_total: IntCounter,
}

impl DuettMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let verbundene_peers = IntGauge::with_opts(Opts::new(
            "duett_connected_peers",
            "Anzahl aktuell verbundener Peers",
        ))?;
        registry.register(Box::new(verbundene_peers.clone()))?;

        let wartende_peers = IntGauge::with_opts(Opts::new(
            "duett_waiting_peers",
            "Anzahl Peers im Warteplatz",
        ))?;
        registry.register(Box::new(wartende_peers.clone()))?;

        let aktive_raeume = IntGauge::with_opts(Opts::new(
            "duett_active_rooms",
            "Anzahl aktiver Zweier-Raeume",
        ))?;
        registry.register(Box::new(aktive_raeume.clone()))?;

        let paarungen_total = IntCounter::with_opts(Opts::new(
            "duett_matches_total",
            "Gesamtanzahl erfolgreicher Paarungen",
        ))?;
        registry.register(Box::new(paarungen_total.clone()))?;

        let weitergeleitet_total = IntCounterVec::new(
            Opts::new(
                "duett_relayed_events_total",
                "Gesamtanzahl weitergeleiteter Events",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(weitergeleitet_total.clone()))?;

        let verworfen_total = IntCounterVec::new(
            Opts::new(
                "duett_dropped_events_total",
                "Gesamtanzahl still verworfener Events",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(verworfen_total.clone()))?;

        let ungueltige_frames_total = IntCounter::with_opts(Opts::new(
            "duett_invalid_frames_total",
            "Gesamtanzahl nicht dekodierbarer Frames",
        ))?;
        registry.register(Box::new(ungueltige_frames_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            verbundene_peers,
            wartende_peers,
            aktive_raeume,
            paarungen_total,
            weitergeleitet_total,
            verworfen_total,
            ungueltige_frames_total,
        })
    }

    /// Zaehlt ein weitergeleitetes Event
    pub fn weitergeleitet(&self, art: &str) {
        self.weitergeleitet_total.with_label_values(&[art]).inc();
    }

    /// Zaehlt ein verworfenes Event
    pub fn verworfen(&self, art: &str) {
        self.verworfen_total.with_label_values(&[art]).inc();
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
pub fn metrics_router(metriken: DuettMetriken) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<DuettMetriken>) -> impl IntoResponse {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = DuettMetriken::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauges_setzen() {
        let metriken = DuettMetriken::neu().unwrap();
        metriken.verbundene_peers.set(3);
        metriken.wartende_peers.set(1);
        metriken.aktive_raeume.set(1);
        assert_eq!(metriken.verbundene_peers.get(), 3);
        assert_eq!(metriken.wartende_peers.get(), 1);
        assert_eq!(metriken.aktive_raeume.get(), 1);
    }

    #[test]
    fn counter_mit_labels() {
        let metriken = DuettMetriken::neu().unwrap();
        metriken.weitergeleitet("signal");
        metriken.weitergeleitet("signal");
        metriken.verworfen("chat");
        assert_eq!(
            metriken.weitergeleitet_total.with_label_values(&["signal"]).get(),
            2
        );
        assert_eq!(metriken.verworfen_total.with_label_values(&["chat"]).get(), 1);
    }

    #[test]
    fn clone_teilt_zaehler() {
        let a = DuettMetriken::neu().unwrap();
        let b = a.clone();
        a.paarungen_total.inc();
        assert_eq!(b.paarungen_total.get(), 1);
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = DuettMetriken::neu().unwrap();
        metriken.verbundene_peers.set(2);
        metriken.paarungen_total.inc();
        metriken.weitergeleitet("chat");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("duett_connected_peers 2"));
        assert!(output.contains("duett_matches_total 1"));
        assert!(output.contains("duett_relayed_events_total{kind=\"chat\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
