//! Raum-Router – Zustellung an Raeume und an alle Verbindungen
//!
//! Jede Verbindung registriert sich beim Oeffnen und erhaelt eine
//! unbegrenzte FIFO-Queue. Raeume entstehen beim ersten Abonnement und
//! verschwinden mit dem letzten Mitglied.
//!
//! ## Zustellung
//! - An einen Raum: `an_raum_senden`
//! - An alle registrierten Verbindungen: `an_alle_senden`
//!
//! Die Sender werden unter dem Lock gesammelt, gesendet wird danach.

use mentorlink_core::types::{ConnectionId, RoomId};
use mentorlink_protocol::ServerEvent;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

/// Empfangsseite der Ausgangs-Queue einer Verbindung
pub type AusgangsQueue = mpsc::UnboundedReceiver<ServerEvent>;

type Sender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Default)]
struct RouterInner {
    verbindungen: HashMap<ConnectionId, Sender>,
    raeume: HashMap<RoomId, HashSet<ConnectionId>>,
    mitgliedschaften: HashMap<ConnectionId, HashSet<RoomId>>,
}

/// Zentraler Router fuer alle verbundenen Clients
#[derive(Default)]
pub struct RoomRouter {
    inner: RwLock<RouterInner>,
}

impl RoomRouter {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Verbindung und gibt ihre Ausgangs-Queue zurueck
    ///
    /// Eine erneute Registrierung ersetzt die alte Queue.
    pub fn verbindung_registrieren(&self, verbindung: ConnectionId) -> AusgangsQueue {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().verbindungen.insert(verbindung, tx);
        tracing::debug!(verbindung = %verbindung, "Verbindung im Router registriert");
        rx
    }

    /// Entfernt eine Verbindung samt aller Abonnements (idempotent)
    pub fn verbindung_entfernen(&self, verbindung: ConnectionId) {
        let mut inner = self.inner.write();
        inner.verbindungen.remove(&verbindung);

        let raeume = inner.mitgliedschaften.remove(&verbindung).unwrap_or_default();
        for raum in raeume {
            raum_austragen(&mut inner.raeume, &raum, verbindung);
        }
    }

    /// Abonniert einen Raum; der Raum wird bei Bedarf angelegt
    pub fn abonnieren(&self, verbindung: ConnectionId, raum: RoomId) {
        let mut inner = self.inner.write();
        inner
            .raeume
            .entry(raum.clone())
            .or_default()
            .insert(verbindung);
        inner
            .mitgliedschaften
            .entry(verbindung)
            .or_default()
            .insert(raum.clone());
        tracing::debug!(verbindung = %verbindung, raum = %raum, "Raum abonniert");
    }

    /// Beendet ein Abonnement; leere Raeume werden entfernt
    pub fn abbestellen(&self, verbindung: ConnectionId, raum: &RoomId) {
        let mut inner = self.inner.write();
        raum_austragen(&mut inner.raeume, raum, verbindung);
        if let Some(mitglied) = inner.mitgliedschaften.get_mut(&verbindung) {
            mitglied.remove(raum);
            if mitglied.is_empty() {
                inner.mitgliedschaften.remove(&verbindung);
            }
        }
    }

    /// Stellt ein Ereignis allen Mitgliedern eines Raums zu
    ///
    /// Gibt die Anzahl erfolgreich eingereihter Zustellungen zurueck.
    /// Ein unbekannter oder leerer Raum ergibt 0.
    pub fn an_raum_senden(&self, raum: &RoomId, ereignis: ServerEvent) -> usize {
        let empfaenger: Vec<Sender> = {
            let inner = self.inner.read();
            match inner.raeume.get(raum) {
                Some(mitglieder) => mitglieder
                    .iter()
                    .filter_map(|c| inner.verbindungen.get(c).cloned())
                    .collect(),
                None => Vec::new(),
            }
        };

        if empfaenger.is_empty() {
            tracing::debug!(raum = %raum, ereignis = ereignis.name(), "Raum ohne Mitglieder");
            return 0;
        }
        zustellen(empfaenger, ereignis)
    }

    /// Stellt ein Ereignis allen registrierten Verbindungen zu
    pub fn an_alle_senden(&self, ereignis: ServerEvent) -> usize {
        let empfaenger: Vec<Sender> = self.inner.read().verbindungen.values().cloned().collect();
        zustellen(empfaenger, ereignis)
    }

    pub fn verbindungs_anzahl(&self) -> usize {
        self.inner.read().verbindungen.len()
    }

    /// Aktuelle Mitglieder eines Raums
    pub fn mitglieder(&self, raum: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .read()
            .raeume
            .get(raum)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn raum_anzahl(&self) -> usize {
        self.inner.read().raeume.len()
    }
}

fn raum_austragen(
    raeume: &mut HashMap<RoomId, HashSet<ConnectionId>>,
    raum: &RoomId,
    verbindung: ConnectionId,
) {
    if let Some(mitglieder) = raeume.get_mut(raum) {
        mitglieder.remove(&verbindung);
        if mitglieder.is_empty() {
            raeume.remove(raum);
        }
    }
}

/// Sendet ausserhalb des Locks; geschlossene Queues werden uebersprungen
fn zustellen(empfaenger: Vec<Sender>, ereignis: ServerEvent) -> usize {
    let Some((letzter, rest)) = empfaenger.split_last() else {
        return 0;
    };

    let mut zugestellt = 0;
    for tx in rest {
        if tx.send(ereignis.clone()).is_ok() {
            zugestellt += 1;
        }
    }
    if letzter.send(ereignis).is_ok() {
        zugestellt += 1;
    }
    zugestellt
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentorlink_core::types::ParticipantId;

    fn user_left(id: &str) -> ServerEvent {
        ServerEvent::UserLeft {
            participant_id: ParticipantId::from(id),
        }
    }

    #[test]
    fn registrieren_und_entfernen() {
        let router = RoomRouter::neu();
        let c = ConnectionId::new();
        let _rx = router.verbindung_registrieren(c);
        assert_eq!(router.verbindungs_anzahl(), 1);

        router.verbindung_entfernen(c);
        router.verbindung_entfernen(c);
        assert_eq!(router.verbindungs_anzahl(), 0);
    }

    #[test]
    fn an_raum_senden() {
        let router = RoomRouter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = router.verbindung_registrieren(a);
        let mut rx_b = router.verbindung_registrieren(b);
        router.abonnieren(a, RoomId::from("u1"));

        assert_eq!(router.an_raum_senden(&RoomId::from("u1"), user_left("x")), 1);
        assert_eq!(rx_a.try_recv().unwrap(), user_left("x"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn unbekannter_raum_ergibt_null() {
        let router = RoomRouter::neu();
        let _rx = router.verbindung_registrieren(ConnectionId::new());
        assert_eq!(router.an_raum_senden(&RoomId::from("niemand"), user_left("x")), 0);
    }

    #[test]
    fn broadcast_erreicht_auch_verbindungen_ohne_raum() {
        let router = RoomRouter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = router.verbindung_registrieren(a);
        let mut rx_b = router.verbindung_registrieren(b);
        router.abonnieren(a, RoomId::from("u1"));

        assert_eq!(router.an_alle_senden(user_left("u9")), 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn leere_raeume_werden_entfernt() {
        let router = RoomRouter::neu();
        let c = ConnectionId::new();
        let _rx = router.verbindung_registrieren(c);
        let raum = RoomId::from("u1");

        router.abonnieren(c, raum.clone());
        assert_eq!(router.raum_anzahl(), 1);
        router.abbestellen(c, &raum);
        assert_eq!(router.raum_anzahl(), 0);
        assert!(router.mitglieder(&raum).is_empty());
    }

    #[test]
    fn entfernen_loescht_alle_abonnements() {
        let router = RoomRouter::neu();
        let c = ConnectionId::new();
        let andere = ConnectionId::new();
        let _rx = router.verbindung_registrieren(c);
        let _rx2 = router.verbindung_registrieren(andere);

        router.abonnieren(c, RoomId::from("r1"));
        router.abonnieren(c, RoomId::from("r2"));
        router.abonnieren(andere, RoomId::from("r2"));

        router.verbindung_entfernen(c);
        assert_eq!(router.raum_anzahl(), 1);
        assert_eq!(router.mitglieder(&RoomId::from("r2")), vec![andere]);
    }

    #[test]
    fn geschlossene_queue_zaehlt_nicht() {
        let router = RoomRouter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let rx_a = router.verbindung_registrieren(a);
        let _rx_b = router.verbindung_registrieren(b);
        drop(rx_a);

        assert_eq!(router.an_alle_senden(user_left("x")), 1);
    }

    #[test]
    fn reihenfolge_bleibt_erhalten() {
        let router = RoomRouter::neu();
        let c = ConnectionId::new();
        let mut rx = router.verbindung_registrieren(c);
        router.abonnieren(c, RoomId::from("u1"));

        for i in 0..20 {
            router.an_raum_senden(&RoomId::from("u1"), user_left(&i.to_string()));
        }
        for i in 0..20 {
            assert_eq!(rx.try_recv().unwrap(), user_left(&i.to_string()));
        }
    }
}
