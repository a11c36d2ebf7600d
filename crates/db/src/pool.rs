//! SQLite Connection Pool

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::DbError;

/// Wrapper um den SQLite Connection Pool
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet den Pool und prueft die Verbindung mit einem Ping
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        if config.url.trim().is_empty() {
            return Err(DbError::KeineUrl);
        }
        if !config.url.starts_with("sqlite:") {
            return Err(DbError::UngueltigeUrl {
                url: config.url.clone(),
                grund: "nur sqlite:-URLs werden unterstuetzt".into(),
            });
        }

        let opts = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::UngueltigeUrl {
                url: config.url.clone(),
                grund: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .acquire_timeout(config.verbindungs_timeout)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.ping().await?;

        info!(url = %config.url, max = config.max_verbindungen, "SQLite-Pool geoeffnet");
        Ok(db)
    }

    /// Prueft ob die Datenbank erreichbar ist
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        debug!("Datenbank-Ping erfolgreich");
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Schliesst alle Verbindungen des Pools
    pub async fn schliessen(&self) {
        self.pool.close().await;
        info!("SQLite-Pool geschlossen");
    }

    /// Erstellt eine In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> Result<Self, DbError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // In-Memory benoetigt mindestens 1 persistente Verbindung
            .min_connections(1)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }
}
