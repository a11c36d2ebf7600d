//! Teilnehmer-Handler – Beitritt und Trennung
//!
//! Beitritt traegt den Teilnehmer ins Verzeichnis ein und abonniert seinen
//! eigenen Raum; ein frueherer Raum derselben Verbindung und der Raum einer
//! verdraengten Verbindung werden abbestellt. Die Trennung raeumt beides
//! auf und kuendigt den Austritt allen Verbindungen an.

use mentorlink_core::types::Role;
use mentorlink_protocol::events::JoinPayload;
use mentorlink_protocol::ServerEvent;

use crate::connection::ConnectionHandle;
use crate::server_state::SignalingState;

/// Nachricht im `call-rejected` nach einem Verbindungsabbruch
pub const GETRENNT_NACHRICHT: &str = "the user disconnected";

/// `join`: Verzeichnis, eigener Raum, bei Mentees globale Ankuendigung
pub fn handle_join(payload: JoinPayload, handle: &ConnectionHandle, state: &SignalingState) -> usize {
    let JoinPayload {
        participant_id,
        role,
    } = payload;
    let verbindung = handle.id();

    let Some(beitritt) = state.directory.beitreten(verbindung, participant_id.clone(), role)
    else {
        return 0;
    };

    // Raeume werden beim erneuten Beitritt komplett ersetzt
    if let Some(alt) = beitritt.abgeloest {
        state.router.abbestellen(verbindung, &alt.raum());
    }
    if let Some(verdraengt) = beitritt.verdraengt {
        state.router.abbestellen(verdraengt, &participant_id.raum());
        tracing::info!(
            verbindung = %verdraengt,
            teilnehmer = %participant_id,
            "Teilnehmer-ID uebernommen, alter Raum abbestellt"
        );
    }
    state.router.abonnieren(verbindung, participant_id.raum());
    state
        .metriken
        .participants_joined
        .set(state.directory.anzahl() as i64);

    tracing::info!(
        verbindung = %verbindung,
        teilnehmer = %participant_id,
        rolle = %role,
        "Teilnehmer beigetreten"
    );

    match role {
        Role::Mentee => state.an_alle_senden(ServerEvent::MenteeJoined { participant_id }),
        Role::Mentor => 0,
    }
}

/// Trennung einer Verbindung (implizit, hoechstens einmal pro Verbindung)
///
/// Ohne gebundenen Teilnehmer wird nichts angekuendigt.
pub fn handle_disconnect(handle: &ConnectionHandle, state: &SignalingState) -> usize {
    let verbindung = handle.id();
    let teilnehmer = state.directory.verlassen(verbindung);
    state.router.verbindung_entfernen(verbindung);

    state.metriken.connections_active.dec();
    state
        .metriken
        .participants_joined
        .set(state.directory.anzahl() as i64);

    let Some(teilnehmer) = teilnehmer else {
        tracing::debug!(verbindung = %verbindung, "Verbindung ohne Teilnehmer getrennt");
        return 0;
    };

    tracing::info!(verbindung = %verbindung, teilnehmer = %teilnehmer, "Teilnehmer verlassen");

    let mut zugestellt = state.an_alle_senden(ServerEvent::UserLeft {
        participant_id: teilnehmer.clone(),
    });
    zugestellt += state.an_alle_senden(ServerEvent::CallRejected {
        caller_id: Some(teilnehmer),
        message: GETRENNT_NACHRICHT.to_string(),
    });
    zugestellt
}
