//! Structured Logging Setup via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei:
//! - `ML_LOG_LEVEL`: EnvFilter-Direktive (z.B. `info` oder `mentorlink_signaling=debug`)
//! - `ML_LOG_FORMAT`: `text` oder `json`

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "ML_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "ML_LOG_FORMAT";

/// Initialisiert den globalen tracing-Subscriber.
///
/// Ungueltige Filter fallen auf `info` zurueck, unbekannte Formate auf `text`.
/// Schlaegt fehl, wenn bereits ein Subscriber gesetzt ist.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let aus_env = std::env::var(ENV_LOG_FORMAT).ok();
    let format = effektives_format(aus_env.as_deref(), format);

    let ergebnis = if format == "json" {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    ergebnis.map_err(|e| anyhow!("Logging konnte nicht initialisiert werden: {e}"))
}

/// Waehlt das Format: Umgebung vor Konfiguration, unbekannt -> `text`
pub fn effektives_format<'a>(aus_env: Option<&'a str>, aus_config: &'a str) -> &'a str {
    let kandidat = aus_env.unwrap_or(aus_config);
    if log_format_gueltig(kandidat) {
        kandidat
    } else {
        "text"
    }
}

pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
