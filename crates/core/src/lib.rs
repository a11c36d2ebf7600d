//! mentorlink-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen MentorLink-Crates gemeinsam genutzt werden: Teilnehmer-,
//! Verbindungs- und Raum-IDs sowie die Teilnehmer-Rolle.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{ConnectionId, ParticipantId, Role, RoomId};
