//! Signaling-Dispatcher – Routet Client-Ereignisse an die Handler
//!
//! Der Dispatcher ist die Bruecke zwischen Transport und Kern:
//! - `verbinden`: neue Verbindung im Router registrieren
//! - `rohes_ereignis`: Textframe dekodieren, validieren, dispatchen
//! - `dispatch`: typisiertes Ereignis an den passenden Handler
//! - `trennen`: Aufraeumen, hoechstens einmal pro Verbindung
//!
//! Fehlerhafte Ereignisse werden verworfen. Der Absender erhaelt keine
//! Rueckmeldung, die Verbindung bleibt offen.

use mentorlink_protocol::{decode_client_event, ClientEvent};
use std::sync::Arc;

use crate::connection::ConnectionHandle;
use crate::error::{SignalingError, SignalingResult};
use crate::handlers::{call_handler, chat_handler, teilnehmer_handler};
use crate::router::AusgangsQueue;
use crate::server_state::SignalingState;

/// Zentraler Ereignis-Dispatcher
#[derive(Clone)]
pub struct SignalingDispatcher {
    state: Arc<SignalingState>,
}

impl SignalingDispatcher {
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Registriert eine neue Verbindung und gibt Handle und Ausgangs-Queue zurueck
    pub fn verbinden(&self) -> (ConnectionHandle, AusgangsQueue) {
        let handle = ConnectionHandle::neu();
        let queue = self.state.router.verbindung_registrieren(handle.id());
        self.state.metriken.connections_active.inc();
        (handle, queue)
    }

    /// Verarbeitet einen rohen Textframe
    ///
    /// Fehler werden geloggt und gezaehlt, aber nicht weitergegeben.
    pub fn rohes_ereignis(&self, handle: &ConnectionHandle, text: &str) {
        let ergebnis = decode_client_event(text, self.state.config.max_frame_size)
            .map_err(SignalingError::from)
            .and_then(|ereignis| self.dispatch(handle, ereignis));

        if let Err(e) = ergebnis {
            tracing::warn!(
                verbindung = %handle.id(),
                grund = e.grund(),
                fehler = %e,
                "Ereignis verworfen"
            );
            self.state.metriken.verworfen(e.grund());
        }
    }

    /// Fuehrt ein bereits dekodiertes Ereignis aus
    ///
    /// Gibt die Anzahl der Zustellungen zurueck. Ereignisse auf einer
    /// bereits getrennten Verbindung werden ignoriert.
    pub fn dispatch(&self, handle: &ConnectionHandle, ereignis: ClientEvent) -> SignalingResult<usize> {
        if handle.ist_geschlossen() {
            return Ok(0);
        }
        ereignis.validieren()?;

        let name = ereignis.name();
        let state = self.state.as_ref();

        let zugestellt = match ereignis {
            ClientEvent::Join(p) => teilnehmer_handler::handle_join(p, handle, state),
            ClientEvent::ChatSend(p) => chat_handler::handle_chat_send(p, handle, state),
            ClientEvent::CallInitiate(p) => call_handler::handle_call_initiate(p, state),
            ClientEvent::CallSignal(p) => call_handler::handle_call_signal(p, handle, state),
            ClientEvent::CallAnswer(p) => call_handler::handle_call_answer(p, state)?,
            ClientEvent::IceCandidate(p) => call_handler::handle_ice_candidate(p, state),
            ClientEvent::CallEnd(p) => call_handler::handle_call_end(p, state),
            ClientEvent::CallRejected(p) => call_handler::handle_call_rejected(p, state),
        };

        self.state.metriken.ereignis(name);
        tracing::debug!(verbindung = %handle.id(), ereignis = name, zugestellt, "Ereignis verarbeitet");
        Ok(zugestellt)
    }

    /// Trennt eine Verbindung (idempotent)
    pub fn trennen(&self, handle: &ConnectionHandle) {
        if !handle.schliessen_markieren() {
            return;
        }
        teilnehmer_handler::handle_disconnect(handle, &self.state);
    }

    pub fn state(&self) -> &Arc<SignalingState> {
        &self.state
    }
}
