//! Chat-Handler – Textnachrichten an einen Teilnehmer-Raum

use mentorlink_protocol::events::ChatSendPayload;
use mentorlink_protocol::ServerEvent;

use crate::connection::ConnectionHandle;
use crate::server_state::SignalingState;

/// `chat-send` -> `chat-receive` an den Zielraum
///
/// Absender ist die Verbindungs-ID, nicht die Teilnehmer-ID.
pub fn handle_chat_send(
    payload: ChatSendPayload,
    handle: &ConnectionHandle,
    state: &SignalingState,
) -> usize {
    let ChatSendPayload {
        destination_id,
        message,
    } = payload;

    state.an_raum_senden(
        &destination_id,
        ServerEvent::ChatReceive {
            sender: handle.id(),
            message,
        },
    )
}
