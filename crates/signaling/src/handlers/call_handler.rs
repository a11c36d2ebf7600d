//! Call-Handler – Anruf-Lebenszyklus und WebRTC-Verhandlung
//!
//! Es gibt keinen Anrufzustand: jedes Ereignis wird unabhaengig an den
//! adressierten Raum weitergeleitet. Signal-, Answer- und Candidate-Inhalte
//! bleiben unveraendert.

use mentorlink_protocol::events::{
    CallAnswerPayload, CallEndPayload, CallInitiatePayload, CallRejectedPayload,
    CallSignalPayload, IceCandidatePayload,
};
use mentorlink_protocol::ServerEvent;

use crate::connection::ConnectionHandle;
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::{CallAnswerContract, SignalingState};

/// `call-initiate` -> `incoming-call` an den Angerufenen
pub fn handle_call_initiate(payload: CallInitiatePayload, state: &SignalingState) -> usize {
    tracing::debug!(anrufer = %payload.caller_id, angerufener = %payload.callee_id, "Anruf eingeleitet");
    state.an_raum_senden(
        &payload.callee_id.raum(),
        ServerEvent::IncomingCall {
            caller_id: payload.caller_id,
        },
    )
}

/// `call-signal` -> `call-signal` mit der Verbindungs-ID des Absenders
pub fn handle_call_signal(
    payload: CallSignalPayload,
    handle: &ConnectionHandle,
    state: &SignalingState,
) -> usize {
    state.an_raum_senden(
        &payload.destination_id,
        ServerEvent::CallSignal {
            from_id: handle.id(),
            signal: payload.signal,
        },
    )
}

/// `call-answer` nach dem konfigurierten Vertrag
///
/// Nur die Felder des konfigurierten Vertrags werden gelesen; zusaetzliche
/// Felder des anderen Vertrags sind erlaubt. Fehlen die Pflichtfelder, wird
/// das Ereignis abgelehnt.
pub fn handle_call_answer(
    payload: CallAnswerPayload,
    state: &SignalingState,
) -> SignalingResult<usize> {
    let vertrag = state.config.call_answer;
    let falscher_vertrag = || SignalingError::FalscherAntwortVertrag {
        erwartet: vertrag.as_str(),
    };

    match vertrag {
        CallAnswerContract::Destination => {
            let ziel = payload.ziel().cloned().ok_or_else(falscher_vertrag)?;
            Ok(state.an_raum_senden(
                &ziel,
                ServerEvent::CallAnswer {
                    answer: payload.answer,
                },
            ))
        }
        CallAnswerContract::CallerCallee => {
            let (anrufer, angerufener) =
                payload.anrufer_angerufener().ok_or_else(falscher_vertrag)?;
            tracing::debug!(anrufer = %anrufer, angerufener = %angerufener, "Anruf angenommen");
            let raum = anrufer.raum();
            Ok(state.an_raum_senden(
                &raum,
                ServerEvent::CallAnswered {
                    answer: payload.answer,
                },
            ))
        }
    }
}

/// `ice-candidate` -> `ice-candidate` an den Zielraum
pub fn handle_ice_candidate(payload: IceCandidatePayload, state: &SignalingState) -> usize {
    state.an_raum_senden(
        &payload.destination_id,
        ServerEvent::IceCandidate {
            candidate: payload.candidate,
        },
    )
}

/// `call-end` -> `call-end` an den genannten Raum
pub fn handle_call_end(payload: CallEndPayload, state: &SignalingState) -> usize {
    let raum = payload.room_id;
    state.an_raum_senden(&raum, ServerEvent::CallEnd { room_id: raum.clone() })
}

/// `call-rejected` -> `call-rejected` (nur mit Nachricht) an den Anrufer
pub fn handle_call_rejected(payload: CallRejectedPayload, state: &SignalingState) -> usize {
    state.an_raum_senden(
        &payload.caller_id.raum(),
        ServerEvent::CallRejected {
            caller_id: None,
            message: payload.message,
        },
    )
}
