//! Signaling-Ereignisse (WebSocket)
//!
//! Definiert alle Ereignisse die ueber die WebSocket-Verbindung zwischen
//! Client und Relay ausgetauscht werden.
//!
//! ## Design
//! - Fire-and-forget: es gibt keine Antworten oder Fehler-Rueckmeldungen
//! - JSON-Serialisierung via serde, adjacently tagged (`event` + `data`)
//! - Ein typisierter Payload pro Ereignis; Signal-, Answer- und
//!   Candidate-Inhalte bleiben opakes JSON und werden unveraendert
//!   weitergeleitet

use mentorlink_core::types::{ConnectionId, ParticipantId, Role, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Beitritt eines Teilnehmers mit Rolle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub participant_id: ParticipantId,
    pub role: Role,
}

/// Chat-Nachricht an einen Teilnehmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendPayload {
    pub destination_id: RoomId,
    pub message: String,
}

/// Anruf-Einladung
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInitiatePayload {
    pub caller_id: ParticipantId,
    pub callee_id: ParticipantId,
}

/// WebRTC-Signal (Offer o.ae.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSignalPayload {
    pub destination_id: RoomId,
    pub signal: Value,
}

/// Antwort auf einen Anruf
///
/// Zwei Feldvertraege existieren: `{destinationId, answer}` und
/// `{callerId, calleeId, answer}`. Alle Adressfelder sind optional; welche
/// davon Pflicht sind, entscheidet der konfigurierte Vertrag im Relay.
/// Ein Frame darf Felder beider Vertraege tragen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnswerPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee_id: Option<ParticipantId>,
    pub answer: Value,
}

impl CallAnswerPayload {
    /// Zielraum, falls `destinationId` gesetzt und nicht leer ist
    pub fn ziel(&self) -> Option<&RoomId> {
        self.destination_id.as_ref().filter(|r| !r.as_str().is_empty())
    }

    /// `(callerId, calleeId)`, falls beide gesetzt und nicht leer sind
    pub fn anrufer_angerufener(&self) -> Option<(&ParticipantId, &ParticipantId)> {
        let anrufer = self.caller_id.as_ref().filter(|p| !p.as_str().is_empty())?;
        let angerufener = self.callee_id.as_ref().filter(|p| !p.as_str().is_empty())?;
        Some((anrufer, angerufener))
    }
}

/// ICE-Kandidat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub destination_id: RoomId,
    pub candidate: Value,
}

/// Anruf beenden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEndPayload {
    pub room_id: RoomId,
}

/// Anruf abgelehnt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRejectedPayload {
    pub caller_id: ParticipantId,
    pub message: String,
}

/// Alle Ereignisse die ein Client senden darf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Join(JoinPayload),
    ChatSend(ChatSendPayload),
    CallInitiate(CallInitiatePayload),
    CallSignal(CallSignalPayload),
    CallAnswer(CallAnswerPayload),
    IceCandidate(IceCandidatePayload),
    CallEnd(CallEndPayload),
    CallRejected(CallRejectedPayload),
}

impl ClientEvent {
    /// Alle bekannten Ereignisnamen (Client -> Relay)
    pub const NAMEN: [&'static str; 8] = [
        "join",
        "chat-send",
        "call-initiate",
        "call-signal",
        "call-answer",
        "ice-candidate",
        "call-end",
        "call-rejected",
    ];

    /// Wire-Name des Ereignisses
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::ChatSend(_) => "chat-send",
            Self::CallInitiate(_) => "call-initiate",
            Self::CallSignal(_) => "call-signal",
            Self::CallAnswer(_) => "call-answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::CallEnd(_) => "call-end",
            Self::CallRejected(_) => "call-rejected",
        }
    }

    /// Prueft die Anwesenheit aller Pflichtfelder
    ///
    /// Strings duerfen nicht leer sein, JSON-Inhalte nicht `null`.
    /// Es findet keine semantische Pruefung statt.
    pub fn validieren(&self) -> Result<(), ProtocolError> {
        let ereignis = self.name();
        let fehlt = |feld: &'static str| ProtocolError::FeldFehlt { ereignis, feld };

        match self {
            Self::Join(p) => {
                pflicht_str(p.participant_id.as_str(), || fehlt("participantId"))?;
            }
            Self::ChatSend(p) => {
                pflicht_str(p.destination_id.as_str(), || fehlt("destinationId"))?;
                pflicht_str(&p.message, || fehlt("message"))?;
            }
            Self::CallInitiate(p) => {
                pflicht_str(p.caller_id.as_str(), || fehlt("callerId"))?;
                pflicht_str(p.callee_id.as_str(), || fehlt("calleeId"))?;
            }
            Self::CallSignal(p) => {
                pflicht_str(p.destination_id.as_str(), || fehlt("destinationId"))?;
                pflicht_wert(&p.signal, || fehlt("signal"))?;
            }
            // Adressfelder prueft das Relay je nach Vertrag
            Self::CallAnswer(p) => {
                pflicht_wert(&p.answer, || fehlt("answer"))?;
            }
            Self::IceCandidate(p) => {
                pflicht_str(p.destination_id.as_str(), || fehlt("destinationId"))?;
                pflicht_wert(&p.candidate, || fehlt("candidate"))?;
            }
            Self::CallEnd(p) => {
                pflicht_str(p.room_id.as_str(), || fehlt("roomId"))?;
            }
            Self::CallRejected(p) => {
                pflicht_str(p.caller_id.as_str(), || fehlt("callerId"))?;
                pflicht_str(&p.message, || fehlt("message"))?;
            }
        }
        Ok(())
    }
}

fn pflicht_str(
    wert: &str,
    fehler: impl FnOnce() -> ProtocolError,
) -> Result<(), ProtocolError> {
    if wert.is_empty() {
        Err(fehler())
    } else {
        Ok(())
    }
}

fn pflicht_wert(
    wert: &Value,
    fehler: impl FnOnce() -> ProtocolError,
) -> Result<(), ProtocolError> {
    if wert.is_null() {
        Err(fehler())
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Alle Ereignisse die das Relay an Clients zustellt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Globale Ankuendigung eines neuen Mentees
    MenteeJoined { participant_id: ParticipantId },
    /// Chat-Nachricht; `sender` ist die Verbindung des Absenders
    ChatReceive {
        sender: ConnectionId,
        message: String,
    },
    IncomingCall { caller_id: ParticipantId },
    CallSignal { from_id: ConnectionId, signal: Value },
    /// Antwort im `destination`-Vertrag
    CallAnswer { answer: Value },
    /// Antwort im `caller-callee`-Vertrag
    CallAnswered { answer: Value },
    IceCandidate { candidate: Value },
    CallEnd { room_id: RoomId },
    /// Ablehnung; `callerId` ist nur bei Verbindungsabbruch gesetzt
    CallRejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caller_id: Option<ParticipantId>,
        message: String,
    },
    UserLeft { participant_id: ParticipantId },
}

impl ServerEvent {
    /// Wire-Name des Ereignisses
    pub fn name(&self) -> &'static str {
        match self {
            Self::MenteeJoined { .. } => "mentee-joined",
            Self::ChatReceive { .. } => "chat-receive",
            Self::IncomingCall { .. } => "incoming-call",
            Self::CallSignal { .. } => "call-signal",
            Self::CallAnswer { .. } => "call-answer",
            Self::CallAnswered { .. } => "call-answered",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::CallEnd { .. } => "call-end",
            Self::CallRejected { .. } => "call-rejected",
            Self::UserLeft { .. } => "user-left",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
