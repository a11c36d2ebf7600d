//! mentorlink-protocol – Signaling-Ereignisse und Wire-Format
//!
//! Dieses Crate definiert alle Ereignisse die zwischen Client und Relay
//! ausgetauscht werden, sowie das JSON-Envelope-Format der WebSocket-Frames:
//!
//! ```text
//! {"event": "<name>", "data": { ... }}
//! ```

pub mod error;
pub mod events;
pub mod wire;

pub use error::ProtocolError;
pub use events::{CallAnswerPayload, ClientEvent, ServerEvent};
pub use wire::{decode_client_event, encode_server_event};
