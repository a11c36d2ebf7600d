//! mentorlink-server – Bibliotheks-Root
//!
//! Baut die HTTP-Anwendung (WebSocket-Signaling, Health, CORS) und stellt
//! den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use config::ServerConfig;
use mentorlink_db::SqliteDb;
use mentorlink_observability::{
    health_router, observability_server_starten, request_timing_layer, timing_middleware,
    HealthState, RelayMetrics,
};
use mentorlink_signaling::{signaling_router, SignalingState};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis Ctrl-C
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (Fehler beendet den Start)
    /// 2. HTTP-Listener binden
    /// 3. Signaling-Zustand und Routen aufbauen, bedienen
    pub async fn starten(self) -> Result<()> {
        let db = SqliteDb::oeffnen(&self.config.datenbank.pool_config())
            .await
            .context("Datenbankverbindung fehlgeschlagen")?;

        let adresse = self.config.http_bind_adresse();
        let listener = TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Bind auf {adresse} fehlgeschlagen"))?;

        self.bedienen(listener, db, shutdown_signal()).await
    }

    /// Bedient HTTP und WebSocket auf einem bereits gebundenen Listener
    pub async fn bedienen(
        self,
        listener: TcpListener,
        db: SqliteDb,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let metriken = RelayMetrics::neu()?;
        let health = HealthState::neu(metriken.clone());
        health.db_status_setzen(true);

        let state = SignalingState::neu(self.config.signaling.clone(), metriken.clone());

        // Ein externes Signal stoppt alle Teilserver und offenen Verbindungen
        let (stop_tx, stop_rx) = watch::channel(false);
        {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                shutdown.await;
                state.herunterfahren();
                stop_tx.send_replace(true);
            });
        }

        if self.config.observability.aktiviert {
            let adresse: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Adresse")?;
            let stop = warte_auf_stop(stop_rx.clone());
            let (metriken, health) = (metriken.clone(), health.clone());
            tokio::spawn(async move {
                if let Err(e) = observability_server_starten(adresse, metriken, health, stop).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        let app = app(Arc::clone(&state), health, &self.config.cors.origins);
        let lokale_adresse = listener.local_addr()?;

        tracing::info!(
            server_name = %self.config.server.name,
            umgebung = %self.config.server.umgebung,
            adresse = %lokale_adresse,
            call_answer = self.config.signaling.call_answer.as_str(),
            "Server laeuft"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(warte_auf_stop(stop_rx))
            .await?;

        db.schliessen().await;
        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Baut die HTTP-Anwendung: `GET /ws`, `GET /health`, CORS, Tracing
pub fn app(state: Arc<SignalingState>, health: HealthState, cors_origins: &[String]) -> Router {
    signaling_router(state)
        .merge(health_router(health))
        .layer(axum::middleware::from_fn(timing_middleware))
        .layer(request_timing_layer())
        .layer(cors_layer(cors_origins))
}

/// CORS fuer GET und POST; leere Liste erlaubt alle Origins
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let basis = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return basis.allow_origin(Any);
    }

    let erlaubt: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(wert) => Some(wert),
            Err(_) => {
                tracing::warn!(origin = %o, "Ungueltiger CORS-Origin ignoriert");
                None
            }
        })
        .collect();
    basis.allow_origin(erlaubt)
}

async fn warte_auf_stop(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
        Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden"),
    }
}
