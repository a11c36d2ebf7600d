//! Fehlertypen fuer den Signaling-Service

use mentorlink_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
///
/// Keiner dieser Fehler wird an den Client zurueckgemeldet. Ereignis-Fehler
/// fuehren zum Verwerfen des Frames, Transport-Fehler beenden die Verbindung.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Frame konnte nicht dekodiert oder validiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    /// Payload passt nicht zum konfigurierten call-answer-Vertrag
    #[error("call-answer passt nicht zum Vertrag '{erwartet}'")]
    FalscherAntwortVertrag { erwartet: &'static str },

    /// WebSocket-Lese- oder Schreibfehler
    #[error("Transportfehler: {0}")]
    Transport(#[from] axum::Error),

    /// Keine Frames innerhalb des Timeouts
    #[error("Timeout nach {0} Sekunden ohne Frame")]
    Timeout(u64),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,
}

impl SignalingError {
    /// Metrik-Label fuer verworfene Ereignisse
    pub fn grund(&self) -> &'static str {
        match self {
            Self::Protokoll(e) => e.grund(),
            Self::FalscherAntwortVertrag { .. } => "contract_mismatch",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::VerbindungGetrennt => "disconnected",
        }
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grund_aus_protokollfehler() {
        let err: SignalingError = ProtocolError::UnbekanntesEreignis("x".into()).into();
        assert_eq!(err.grund(), "unknown_event");
    }

    #[test]
    fn vertragsfehler_anzeige() {
        let err = SignalingError::FalscherAntwortVertrag {
            erwartet: "caller-callee",
        };
        assert_eq!(err.grund(), "contract_mismatch");
        assert!(err.to_string().contains("caller-callee"));
    }
}
