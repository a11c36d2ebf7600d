//! Konfiguration fuer die Datenbankverbindung

use std::time::Duration;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://mentorlink.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Wartezeit auf eine Verbindung beim Start
    pub verbindungs_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://mentorlink.db".into(),
            max_verbindungen: 5,
            verbindungs_timeout: Duration::from_secs(10),
        }
    }
}
