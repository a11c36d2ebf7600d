//! Gemeinsamer Zustand fuer den Signaling-Service
//!
//! Haelt Verzeichnis, Raum-Router, Metriken und Konfiguration als
//! Arc-Referenzen, die zwischen allen Verbindungs-Tasks geteilt werden.

use mentorlink_core::types::RoomId;
use mentorlink_observability::RelayMetrics;
use mentorlink_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use mentorlink_protocol::ServerEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::directory::Directory;
use crate::router::RoomRouter;

/// Feldvertrag fuer `call-answer`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallAnswerContract {
    /// `{destinationId, answer}` -> `call-answer` an destinationId
    #[default]
    Destination,
    /// `{callerId, calleeId, answer}` -> `call-answered` an callerId
    CallerCallee,
}

impl CallAnswerContract {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::CallerCallee => "caller-callee",
        }
    }
}

/// Obergrenze fuer Keepalive und Verbindungs-Timeout (ein Tag)
pub const MAX_ZEITSPANNE_SEK: u64 = 86_400;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Maximale Groesse eines Textframes in Bytes
    pub max_frame_size: usize,
    /// Akzeptierter call-answer-Vertrag
    pub call_answer: CallAnswerContract,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            call_answer: CallAnswerContract::default(),
        }
    }
}

impl SignalingConfig {
    /// Keepalive-Intervall, begrenzt auf `1..=MAX_ZEITSPANNE_SEK`
    pub fn keepalive_dauer(&self) -> Duration {
        Duration::from_secs(self.keepalive_sek.clamp(1, MAX_ZEITSPANNE_SEK))
    }

    /// Verbindungs-Timeout, begrenzt auf `MAX_ZEITSPANNE_SEK`
    pub fn timeout_dauer(&self) -> Duration {
        Duration::from_secs(self.verbindungs_timeout_sek.min(MAX_ZEITSPANNE_SEK))
    }
}

/// Gemeinsamer Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    pub config: Arc<SignalingConfig>,
    pub directory: Directory,
    pub router: RoomRouter,
    pub metriken: RelayMetrics,
    shutdown_tx: watch::Sender<bool>,
}

impl SignalingState {
    /// Erstellt einen neuen, leeren Zustand
    pub fn neu(config: SignalingConfig, metriken: RelayMetrics) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            config: Arc::new(config),
            directory: Directory::neu(),
            router: RoomRouter::neu(),
            metriken,
            shutdown_tx,
        })
    }

    /// Signalisiert allen offenen Verbindungen das Herunterfahren
    pub fn herunterfahren(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn shutdown_empfaenger(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stellt an einen Raum zu und zaehlt die Zustellungen
    pub fn an_raum_senden(&self, raum: &RoomId, ereignis: ServerEvent) -> usize {
        let anzahl = self.router.an_raum_senden(raum, ereignis);
        self.metriken.zugestellt("room", anzahl);
        anzahl
    }

    /// Stellt an alle Verbindungen zu und zaehlt die Zustellungen
    pub fn an_alle_senden(&self, ereignis: ServerEvent) -> usize {
        let anzahl = self.router.an_alle_senden(ereignis);
        self.metriken.zugestellt("broadcast", anzahl);
        anzahl
    }
}
