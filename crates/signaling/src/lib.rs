//! # mentorlink-signaling
//!
//! WebSocket-Signaling-Relay fuer Mentor/Mentee-Anrufe.
//!
//! ## Architektur
//! ```text
//! WebSocket (/ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task + Schreib-Task)
//!     |
//!     v
//! SignalingDispatcher --> handlers::{teilnehmer, chat, call}
//!     |                          |
//!     v                          v
//! Directory               RoomRouter --> Ausgangs-Queues
//! ```
//!
//! Es wird kein Anrufzustand gehalten. Alle Ereignisse sind
//! fire-and-forget, unbekannte Ziele ergeben null Zustellungen.

pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server_state;
pub mod ws;

pub use connection::{ClientConnection, ConnectionHandle};
pub use directory::{Beitritt, Directory};
pub use dispatcher::SignalingDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use router::RoomRouter;
pub use server_state::{CallAnswerContract, SignalingConfig, SignalingState, MAX_ZEITSPANNE_SEK};
pub use ws::signaling_router;
