//! mentorlink-db – Speicher-Verbindung
//!
//! Das Relay oeffnet beim Start genau einen Connection-Pool und prueft ihn
//! mit einem Ping. Im Signaling-Pfad gibt es keine Lese- oder
//! Schreibzugriffe; schlaegt die Verbindung fehl, startet der Server nicht.

pub mod config;
pub mod error;
pub mod pool;

pub use config::DatabaseConfig;
pub use error::DbError;
pub use pool::SqliteDb;
