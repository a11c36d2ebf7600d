//! Wire-Format fuer WebSocket-Textframes
//!
//! Jeder Frame enthaelt genau ein Ereignis als JSON-Envelope:
//!
//! ```text
//! {"event": "call-signal", "data": {"destinationId": "u2", "signal": {...}}}
//! ```
//!
//! Dekodieren erfolgt zweistufig: zuerst das Envelope (Name + roher
//! Payload), dann der typisierte Payload. So lassen sich unbekannte
//! Ereignisse von fehlerhaften Payloads unterscheiden.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::events::{ClientEvent, ServerEvent};

/// Standard-maximale Frame-Groesse (64 KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Rohes Envelope vor der Typisierung
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Dekodiert und validiert ein eingehendes Ereignis
///
/// # Fehler
/// - `ZuGross` wenn der Frame `max_frame_size` ueberschreitet
/// - `Envelope` bei ungueltigem JSON oder fehlendem `event`-Feld
/// - `UnbekanntesEreignis` bei unbekanntem Namen
/// - `UngueltigeDaten` / `FeldFehlt` bei fehlerhaftem Payload
pub fn decode_client_event(text: &str, max_frame_size: usize) -> Result<ClientEvent, ProtocolError> {
    if text.len() > max_frame_size {
        return Err(ProtocolError::ZuGross {
            laenge: text.len(),
            maximum: max_frame_size,
        });
    }

    let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Envelope)?;

    if !ClientEvent::NAMEN.contains(&envelope.event.as_str()) {
        return Err(ProtocolError::UnbekanntesEreignis(envelope.event));
    }

    let Envelope { event, data } = envelope;
    let ereignis: ClientEvent =
        serde_json::from_value(serde_json::json!({ "event": event, "data": data })).map_err(
            |e| ProtocolError::UngueltigeDaten {
                ereignis: event.clone(),
                grund: e.to_string(),
            },
        )?;

    ereignis.validieren()?;
    Ok(ereignis)
}

/// Serialisiert ein ausgehendes Ereignis als Textframe
pub fn encode_server_event(ereignis: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(ereignis).map_err(ProtocolError::Serialisierung)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CallAnswerPayload, ChatSendPayload};

    fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
        decode_client_event(text, DEFAULT_MAX_FRAME_SIZE)
    }

    #[test]
    fn chat_send_dekodieren() {
        let ev = decode(r#"{"event":"chat-send","data":{"destinationId":"u1","message":"hi"}}"#)
            .unwrap();
        assert_eq!(
            ev,
            ClientEvent::ChatSend(ChatSendPayload {
                destination_id: "u1".into(),
                message: "hi".into(),
            })
        );
    }

    #[test]
    fn fehlendes_feld_wird_erkannt() {
        let err = decode(r#"{"event":"chat-send","data":{"destinationId":"u1"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UngueltigeDaten { ref ereignis, .. } if ereignis == "chat-send"));
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn leerer_string_wird_erkannt() {
        let err = decode(r#"{"event":"join","data":{"participantId":"","role":"mentee"}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FeldFehlt {
                feld: "participantId",
                ..
            }
        ));
    }

    #[test]
    fn unbekanntes_ereignis() {
        let err = decode(r#"{"event":"teleport","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnbekanntesEreignis(ref n) if n == "teleport"));
    }

    #[test]
    fn kein_json() {
        assert!(matches!(
            decode("hallo").unwrap_err(),
            ProtocolError::Envelope(_)
        ));
    }

    #[test]
    fn fehlende_daten() {
        let err = decode(r#"{"event":"call-end"}"#).unwrap_err();
        assert_eq!(err.grund(), "invalid_payload");
    }

    #[test]
    fn unbekannte_rolle_wird_verworfen() {
        let err = decode(r#"{"event":"join","data":{"participantId":"u1","role":"admin"}}"#)
            .unwrap_err();
        assert_eq!(err.grund(), "invalid_payload");
    }

    #[test]
    fn zu_grosser_frame() {
        let text = format!(
            r#"{{"event":"chat-send","data":{{"destinationId":"u1","message":"{}"}}}}"#,
            "x".repeat(100)
        );
        let err = decode_client_event(&text, 32).unwrap_err();
        assert!(matches!(err, ProtocolError::ZuGross { maximum: 32, .. }));
    }

    #[test]
    fn call_answer_mit_ziel() {
        let ev = decode(
            r#"{"event":"call-answer","data":{"destinationId":"u1","answer":{"type":"answer"}}}"#,
        )
        .unwrap();
        match ev {
            ClientEvent::CallAnswer(CallAnswerPayload { destination_id, .. }) => {
                assert_eq!(destination_id, Some("u1".into()));
            }
            other => panic!("Erwartet call-answer, erhalten: {other:?}"),
        }
    }

    #[test]
    fn server_event_kodieren() {
        let text = encode_server_event(&ServerEvent::UserLeft {
            participant_id: "u1".into(),
        })
        .unwrap();
        assert_eq!(text, r#"{"event":"user-left","data":{"participantId":"u1"}}"#);
    }
}
