//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task (Lesen + Dispatch)
//! und besitzt einen Schreib-Task, der die Ausgangs-Queue in den Socket
//! leert.
//!
//! ## Keepalive
//! - Der Schreib-Task sendet alle `keepalive_sek` einen Ping
//! - Kommt innerhalb von `verbindungs_timeout_sek` kein Frame (auch kein
//!   Pong), wird die Verbindung getrennt

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use mentorlink_core::types::ConnectionId;
use mentorlink_protocol::encode_server_event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

use crate::dispatcher::SignalingDispatcher;
use crate::error::{SignalingError, SignalingResult};
use crate::router::AusgangsQueue;
use crate::server_state::SignalingState;

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// Handle einer offenen Verbindung
///
/// Einheit der Adressierung und des Ausfalls. Das `geschlossen`-Flag sorgt
/// dafuer, dass die Trennungslogik hoechstens einmal laeuft.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    geschlossen: AtomicBool,
}

impl ConnectionHandle {
    pub fn neu() -> Self {
        Self {
            id: ConnectionId::new(),
            geschlossen: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Markiert die Verbindung als geschlossen
    ///
    /// Gibt nur beim ersten Aufruf `true` zurueck.
    pub fn schliessen_markieren(&self) -> bool {
        !self.geschlossen.swap(true, Ordering::AcqRel)
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.geschlossen.load(Ordering::Acquire)
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
}

impl ClientConnection {
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Laeuft bis der Client trennt, der Timeout greift oder der Server
    /// herunterfaehrt. Danach wird die Trennungslogik ausgefuehrt.
    pub async fn verarbeiten(self, socket: WebSocket) {
        let dispatcher = SignalingDispatcher::neu(Arc::clone(&self.state));
        let keepalive = self.state.config.keepalive_dauer();
        let timeout_dauer = self.state.config.timeout_dauer();

        let (handle, queue) = dispatcher.verbinden();
        let verbindung = handle.id();
        tracing::info!(verbindung = %verbindung, "Neue Verbindung");

        let (sink, mut stream) = socket.split();
        let mut schreiber = tokio::spawn(schreib_schleife(sink, queue, keepalive, verbindung));
        // Trennt auch dann, wenn dieser Task abbricht
        let waechter = TrennWaechter::neu(dispatcher, handle, schreiber.abort_handle());
        let mut schreiber_beendet = false;

        let mut shutdown_rx = self.state.shutdown_empfaenger();
        let mut letzter_empfang = Instant::now();

        let ergebnis: SignalingResult<()> = loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(nachricht)) => {
                        letzter_empfang = Instant::now();
                        match nachricht {
                            Message::Text(text) => {
                                waechter.dispatcher.rohes_ereignis(&waechter.handle, &text)
                            }
                            Message::Binary(daten) => {
                                tracing::warn!(
                                    verbindung = %verbindung,
                                    laenge = daten.len(),
                                    "Binaerframe verworfen"
                                );
                                self.state.metriken.verworfen("binary");
                            }
                            Message::Ping(_) | Message::Pong(_) => {}
                            Message::Close(_) => break Ok(()),
                        }
                    }
                    Some(Err(e)) => break Err(SignalingError::Transport(e)),
                    None => break Err(SignalingError::VerbindungGetrennt),
                },
                _ = tokio::time::sleep_until(letzter_empfang + timeout_dauer) => {
                    break Err(SignalingError::Timeout(timeout_dauer.as_secs()));
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!(verbindung = %verbindung, "Shutdown-Signal empfangen");
                    break Ok(());
                }
                _ = &mut schreiber => {
                    schreiber_beendet = true;
                    break Err(SignalingError::VerbindungGetrennt);
                }
            }
        };

        match &ergebnis {
            Ok(()) => tracing::info!(verbindung = %verbindung, "Verbindung geschlossen"),
            Err(SignalingError::VerbindungGetrennt) => {
                tracing::info!(verbindung = %verbindung, "Verbindung vom Client getrennt")
            }
            Err(e) => tracing::warn!(verbindung = %verbindung, fehler = %e, "Verbindung abgebrochen"),
        }

        // Entfernt die Queue aus dem Router, der Schreib-Task endet danach
        waechter.trennen();

        if !schreiber_beendet {
            schreiber_beenden(schreiber, keepalive, verbindung).await;
        }
    }
}

/// Fuehrt die Trennung beim Verlassen des Verbindungs-Tasks aus
///
/// Greift auch beim Abbruch durch Panic. Die Trennung selbst ist ueber das
/// Handle idempotent; der Schreib-Task wird beim Drop abgebrochen.
struct TrennWaechter {
    dispatcher: SignalingDispatcher,
    handle: ConnectionHandle,
    schreiber: AbortHandle,
}

impl TrennWaechter {
    fn neu(dispatcher: SignalingDispatcher, handle: ConnectionHandle, schreiber: AbortHandle) -> Self {
        Self {
            dispatcher,
            handle,
            schreiber,
        }
    }

    fn trennen(&self) {
        self.dispatcher.trennen(&self.handle);
    }
}

impl Drop for TrennWaechter {
    fn drop(&mut self) {
        self.trennen();
        self.schreiber.abort();
    }
}

/// Wartet hoechstens `frist` auf das Ende des Schreib-Tasks
///
/// Ein Peer, der nicht mehr liest, blockiert den Schreib-Task im Senden.
/// Nach Ablauf der Frist wird der Task abgebrochen. Gibt `true` zurueck,
/// wenn der Task rechtzeitig endete.
async fn schreiber_beenden(
    mut schreiber: JoinHandle<()>,
    frist: Duration,
    verbindung: ConnectionId,
) -> bool {
    match tokio::time::timeout(frist, &mut schreiber).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(verbindung = %verbindung, fehler = %e, "Schreib-Task abgebrochen");
            true
        }
        Err(_) => {
            tracing::debug!(verbindung = %verbindung, "Schreib-Task haengt, wird abgebrochen");
            schreiber.abort();
            false
        }
    }
}

/// Leert die Ausgangs-Queue in den Socket und sendet Keepalive-Pings
async fn schreib_schleife(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: AusgangsQueue,
    keepalive: Duration,
    verbindung: ConnectionId,
) {
    let mut ping = tokio::time::interval_at(Instant::now() + keepalive, keepalive);

    loop {
        tokio::select! {
            ereignis = queue.recv() => {
                let Some(ereignis) = ereignis else { break };
                let text = match encode_server_event(&ereignis) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(verbindung = %verbindung, fehler = %e, "Ereignis nicht serialisierbar");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!(verbindung = %verbindung, fehler = %e, "Senden fehlgeschlagen");
                    return;
                }
            }
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    return;
                }
                tracing::trace!(verbindung = %verbindung, "Keepalive-Ping gesendet");
            }
        }
    }

    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schliessen_nur_einmal() {
        let handle = ConnectionHandle::neu();
        assert!(!handle.ist_geschlossen());
        assert!(handle.schliessen_markieren());
        assert!(!handle.schliessen_markieren());
        assert!(handle.ist_geschlossen());
    }

    #[test]
    fn paralleles_schliessen_gewinnt_genau_einmal() {
        let handle = Arc::new(ConnectionHandle::neu());
        let gewinner: usize = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || handle.schliessen_markieren())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| t.join().unwrap() as usize)
            .sum();
        assert_eq!(gewinner, 1);
    }

    #[test]
    fn ids_sind_eindeutig() {
        assert_ne!(ConnectionHandle::neu().id(), ConnectionHandle::neu().id());
    }

    fn test_state() -> Arc<SignalingState> {
        SignalingState::neu(
            crate::server_state::SignalingConfig::default(),
            mentorlink_observability::RelayMetrics::neu().unwrap(),
        )
    }

    fn join_frame(id: &str) -> String {
        format!(r#"{{"event":"join","data":{{"participantId":"{id}","role":"mentee"}}}}"#)
    }

    #[tokio::test]
    async fn waechter_trennt_beim_abbruch_des_tasks() {
        let state = test_state();
        let dispatcher = SignalingDispatcher::neu(Arc::clone(&state));
        let (_beobachter, mut q_beobachter) = dispatcher.verbinden();

        let task_dispatcher = dispatcher.clone();
        let task = tokio::spawn(async move {
            let (handle, _queue) = task_dispatcher.verbinden();
            let schreiber = tokio::spawn(std::future::pending::<()>());
            let waechter =
                TrennWaechter::neu(task_dispatcher, handle, schreiber.abort_handle());
            waechter
                .dispatcher
                .rohes_ereignis(&waechter.handle, &join_frame("u1"));
            panic!("Verbindungs-Task bricht ab");
        });
        assert!(task.await.unwrap_err().is_panic());

        assert_eq!(state.directory.anzahl(), 0);
        assert_eq!(state.router.verbindungs_anzahl(), 1);
        assert_eq!(state.metriken.connections_active.get(), 1);

        let mut namen = Vec::new();
        while let Ok(e) = q_beobachter.try_recv() {
            namen.push(e.name());
        }
        assert_eq!(namen, vec!["mentee-joined", "user-left", "call-rejected"]);
    }

    #[tokio::test]
    async fn waechter_trennt_nur_einmal() {
        let state = test_state();
        let dispatcher = SignalingDispatcher::neu(Arc::clone(&state));
        let (_beobachter, mut q_beobachter) = dispatcher.verbinden();
        let (handle, _queue) = dispatcher.verbinden();
        dispatcher.rohes_ereignis(&handle, &join_frame("u1"));

        let schreiber = tokio::spawn(async {});
        let waechter = TrennWaechter::neu(dispatcher, handle, schreiber.abort_handle());
        waechter.trennen();
        drop(waechter);

        let mut user_left = 0;
        while let Ok(e) = q_beobachter.try_recv() {
            if e.name() == "user-left" {
                user_left += 1;
            }
        }
        assert_eq!(user_left, 1);
        assert_eq!(state.metriken.connections_active.get(), 1);
    }

    #[tokio::test]
    async fn haengender_schreiber_wird_abgebrochen() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let schreiber = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        let beendet =
            schreiber_beenden(schreiber, Duration::from_millis(50), ConnectionId::new()).await;
        assert!(!beendet);
        // Der Sender faellt mit dem abgebrochenen Task
        assert!(tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .unwrap()
            .is_err());
    }

    #[tokio::test]
    async fn beendeter_schreiber_wird_abgewartet() {
        let schreiber = tokio::spawn(async {});
        assert!(schreiber_beenden(schreiber, Duration::from_secs(2), ConnectionId::new()).await);
    }
}
