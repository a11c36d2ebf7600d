//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Keine Datenbank-URL konfiguriert")]
    KeineUrl,

    #[error("Ungueltige Datenbank-URL '{url}': {grund}")]
    UngueltigeUrl { url: String, grund: String },

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Gibt true zurueck wenn der Fehler aus der Konfiguration stammt
    pub fn ist_konfiguration(&self) -> bool {
        matches!(self, Self::KeineUrl | Self::UngueltigeUrl { .. })
    }
}
