//! Integration-Tests fuer den Connection-Pool (SQLite)

use std::time::Duration;

use mentorlink_db::{DatabaseConfig, DbError, SqliteDb};

#[tokio::test]
async fn in_memory_ping() {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");

    db.ping().await.expect("Ping fehlgeschlagen");
    db.schliessen().await;
    assert!(db.pool().is_closed());
}

#[tokio::test]
async fn oeffnen_mit_in_memory_url() {
    let config = DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_verbindungen: 1,
        verbindungs_timeout: Duration::from_secs(2),
    };

    let db = SqliteDb::oeffnen(&config)
        .await
        .expect("Pool oeffnen fehlgeschlagen");
    db.ping().await.expect("Ping fehlgeschlagen");
}

#[tokio::test]
async fn leere_url_wird_abgelehnt() {
    let config = DatabaseConfig {
        url: "   ".into(),
        ..DatabaseConfig::default()
    };

    let err = SqliteDb::oeffnen(&config).await.unwrap_err();
    assert!(matches!(err, DbError::KeineUrl));
    assert!(err.ist_konfiguration());
}

#[tokio::test]
async fn falsches_schema_wird_abgelehnt() {
    let config = DatabaseConfig {
        url: "mongodb://localhost:27017/mentorlink".into(),
        ..DatabaseConfig::default()
    };

    let err = SqliteDb::oeffnen(&config).await.unwrap_err();
    assert!(err.ist_konfiguration(), "Erwartet Konfigurationsfehler: {err}");
}

#[tokio::test]
async fn nicht_erreichbare_datei_schlaegt_fehl() {
    let config = DatabaseConfig {
        url: "sqlite:///verzeichnis/das/nicht/existiert/mentorlink.db".into(),
        max_verbindungen: 1,
        verbindungs_timeout: Duration::from_secs(2),
    };

    let err = SqliteDb::oeffnen(&config).await.unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)), "Erwartet SQLx-Fehler: {err}");
}
