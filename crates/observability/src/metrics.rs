//! Prometheus-kompatible Metriken fuer MentorLink
//!
//! Registrierte Metriken:
//! - `mentorlink_connections_active` – Gauge: Offene WebSocket-Verbindungen
//! - `mentorlink_participants_joined` – Gauge: Teilnehmer im Verzeichnis
//! - `mentorlink_events_total` – Counter: Verarbeitete Ereignisse (event)
//! - `mentorlink_events_dropped_total` – Counter: Verworfene Frames (reason)
//! - `mentorlink_deliveries_total` – Counter: Zustellungen (kind = room/broadcast)

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Relay-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Collector-Handles.
#[derive(Clone)]
pub struct RelayMetrics {
    pub registry: Arc<Registry>,

    pub connections_active: IntGauge,
    pub participants_joined: IntGauge,
    pub events_total: IntCounterVec,
    pub events_dropped_total: IntCounterVec,
    pub deliveries_total: IntCounterVec,
}

impl RelayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connections_active = IntGauge::with_opts(Opts::new(
            "mentorlink_connections_active",
            "Anzahl offener WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(connections_active.clone()))?;

        let participants_joined = IntGauge::with_opts(Opts::new(
            "mentorlink_participants_joined",
            "Anzahl Teilnehmer im Verzeichnis",
        ))?;
        registry.register(Box::new(participants_joined.clone()))?;

        let events_total = IntCounterVec::new(
            Opts::new(
                "mentorlink_events_total",
                "Gesamtanzahl verarbeiteter Client-Ereignisse",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let events_dropped_total = IntCounterVec::new(
            Opts::new(
                "mentorlink_events_dropped_total",
                "Gesamtanzahl verworfener Client-Frames",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let deliveries_total = IntCounterVec::new(
            Opts::new(
                "mentorlink_deliveries_total",
                "Gesamtanzahl zugestellter Relay-Ereignisse",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(deliveries_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections_active,
            participants_joined,
            events_total,
            events_dropped_total,
            deliveries_total,
        })
    }

    /// Zaehlt ein verarbeitetes Ereignis
    pub fn ereignis(&self, name: &str) {
        self.events_total.with_label_values(&[name]).inc();
    }

    /// Zaehlt einen verworfenen Frame
    pub fn verworfen(&self, grund: &str) {
        self.events_dropped_total.with_label_values(&[grund]).inc();
    }

    /// Zaehlt erfolgte Zustellungen
    pub fn zugestellt(&self, art: &str, anzahl: usize) {
        self.deliveries_total
            .with_label_values(&[art])
            .inc_by(anzahl as u64);
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
pub fn metrics_router(metriken: RelayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(
    axum::extract::State(metriken): axum::extract::State<RelayMetrics>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = RelayMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_verbindungen() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.connections_active.inc();
        metriken.connections_active.inc();
        metriken.connections_active.dec();
        assert_eq!(metriken.connections_active.get(), 1);
    }

    #[test]
    fn ereignis_counter_mit_labels() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.ereignis("join");
        metriken.ereignis("join");
        metriken.ereignis("chat-send");
        assert_eq!(metriken.events_total.with_label_values(&["join"]).get(), 2);
        assert_eq!(
            metriken.events_total.with_label_values(&["chat-send"]).get(),
            1
        );
    }

    #[test]
    fn zustellungen_summieren() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.zugestellt("broadcast", 3);
        metriken.zugestellt("broadcast", 0);
        assert_eq!(
            metriken.deliveries_total.with_label_values(&["broadcast"]).get(),
            3
        );
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.connections_active.set(5);
        metriken.verworfen("missing_field");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("mentorlink_connections_active 5"));
        assert!(output.contains("mentorlink_events_dropped_total{reason=\"missing_field\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn getrennte_registries_pro_instanz() {
        let a = RelayMetrics::neu().unwrap();
        let b = RelayMetrics::neu().unwrap();
        a.connections_active.set(7);
        assert_eq!(b.connections_active.get(), 0);
    }
}
