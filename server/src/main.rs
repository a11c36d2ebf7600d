//! MentorLink Relay – Einstiegspunkt
//!
//! Laedt `.env` und Konfiguration, initialisiert das Logging und startet
//! den Server. Jeder Startfehler beendet den Prozess mit Exit-Code != 0.

use anyhow::Result;
use mentorlink_observability::logging_initialisieren;
use mentorlink_server::config::{ConfigQuelle, ServerConfig};
use mentorlink_server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // Fehlende .env ist kein Fehler
    dotenv::dotenv().ok();

    let config_pfad =
        std::env::var("MENTORLINK_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let (config, quelle) = ServerConfig::aus_umgebung(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    if quelle == ConfigQuelle::Standardwerte {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "MentorLink Relay wird initialisiert"
    );

    if let Err(e) = Server::neu(config).starten().await {
        tracing::error!(fehler = %format!("{e:#}"), "Server-Start fehlgeschlagen");
        return Err(e);
    }
    Ok(())
}
