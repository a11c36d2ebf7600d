//! Teilnehmer-Verzeichnis – Wer ist anwesend?
//!
//! Prozessweite Zuordnung Teilnehmer-ID -> (Rolle, besitzende Verbindung)
//! plus die explizite Bindung Verbindung -> Teilnehmer-ID.
//!
//! Beide Maps liegen unter einem gemeinsamen Mutex, damit Beitritt und
//! Austritt atomar ueber beide Richtungen wirken.

use mentorlink_core::types::{ConnectionId, ParticipantId, Role};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Eintrag eines anwesenden Teilnehmers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eintrag {
    pub rolle: Role,
    pub besitzer: ConnectionId,
}

/// Was ein Beitritt an frueheren Bindungen ersetzt hat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Beitritt {
    /// Frueherer Teilnehmer dieser Verbindung, falls die ID gewechselt hat
    pub abgeloest: Option<ParticipantId>,
    /// Verbindung, der die Teilnehmer-ID bisher gehoerte
    pub verdraengt: Option<ConnectionId>,
}

#[derive(Default)]
struct DirectoryInner {
    eintraege: HashMap<ParticipantId, Eintrag>,
    bindungen: HashMap<ConnectionId, ParticipantId>,
}

/// Verzeichnis aller beigetretenen Teilnehmer
#[derive(Default)]
pub struct Directory {
    inner: Mutex<DirectoryInner>,
}

impl Directory {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Traegt einen Teilnehmer ein oder ueberschreibt seinen Eintrag
    ///
    /// Der letzte Beitritt gewinnt: Rolle und Besitzer werden ersetzt.
    /// War die Verbindung bereits an eine andere ID gebunden, wird die alte
    /// Bindung geloest und deren Eintrag entfernt, sofern er noch dieser
    /// Verbindung gehoert. Gibt `None` zurueck, wenn die ID leer ist.
    pub fn beitreten(
        &self,
        verbindung: ConnectionId,
        teilnehmer: ParticipantId,
        rolle: Role,
    ) -> Option<Beitritt> {
        if teilnehmer.is_empty() {
            tracing::warn!(verbindung = %verbindung, "Beitritt mit leerer Teilnehmer-ID ignoriert");
            return None;
        }

        let mut inner = self.inner.lock();
        let mut beitritt = Beitritt::default();

        if let Some(alt) = inner.bindungen.insert(verbindung, teilnehmer.clone()) {
            if alt != teilnehmer {
                if inner.eintraege.get(&alt).map(|e| e.besitzer) == Some(verbindung) {
                    inner.eintraege.remove(&alt);
                }
                tracing::debug!(verbindung = %verbindung, alt = %alt, "Alte Bindung ersetzt");
                beitritt.abgeloest = Some(alt);
            }
        }

        let vorher = inner.eintraege.insert(
            teilnehmer.clone(),
            Eintrag {
                rolle,
                besitzer: verbindung,
            },
        );

        // Die uebernommene Verbindung verliert ihre Bindung
        if let Some(vorher) = vorher {
            if vorher.besitzer != verbindung
                && inner.bindungen.get(&vorher.besitzer) == Some(&teilnehmer)
            {
                inner.bindungen.remove(&vorher.besitzer);
                tracing::debug!(
                    teilnehmer = %teilnehmer,
                    alter_besitzer = %vorher.besitzer,
                    "Teilnehmer-ID von neuer Verbindung uebernommen"
                );
                beitritt.verdraengt = Some(vorher.besitzer);
            }
        }

        Some(beitritt)
    }

    /// Loest die Bindung einer Verbindung
    ///
    /// Gibt den Teilnehmer zurueck, dessen Eintrag noch dieser Verbindung
    /// gehoerte und jetzt entfernt wurde. `None` wenn die Verbindung nie
    /// beigetreten ist, bereits ausgetreten ist oder uebernommen wurde.
    pub fn verlassen(&self, verbindung: ConnectionId) -> Option<ParticipantId> {
        let mut inner = self.inner.lock();
        let teilnehmer = inner.bindungen.remove(&verbindung)?;

        match inner.eintraege.get(&teilnehmer) {
            Some(eintrag) if eintrag.besitzer == verbindung => {
                inner.eintraege.remove(&teilnehmer);
                Some(teilnehmer)
            }
            _ => None,
        }
    }

    pub fn rolle_von(&self, teilnehmer: &ParticipantId) -> Option<Role> {
        self.inner.lock().eintraege.get(teilnehmer).map(|e| e.rolle)
    }

    /// Teilnehmer-ID, an die eine Verbindung gebunden ist
    pub fn teilnehmer_von(&self, verbindung: ConnectionId) -> Option<ParticipantId> {
        self.inner.lock().bindungen.get(&verbindung).cloned()
    }

    pub fn eintrag(&self, teilnehmer: &ParticipantId) -> Option<Eintrag> {
        self.inner.lock().eintraege.get(teilnehmer).copied()
    }

    /// Anzahl der Teilnehmer im Verzeichnis
    pub fn anzahl(&self) -> usize {
        self.inner.lock().eintraege.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[test]
    fn beitritt_und_rolle() {
        let dir = Directory::neu();
        let c = ConnectionId::new();
        assert_eq!(dir.beitreten(c, pid("u1"), Role::Mentor), Some(Beitritt::default()));
        assert_eq!(dir.rolle_von(&pid("u1")), Some(Role::Mentor));
        assert_eq!(dir.teilnehmer_von(c), Some(pid("u1")));
        assert_eq!(dir.anzahl(), 1);
    }

    #[test]
    fn letzter_beitritt_gewinnt() {
        let dir = Directory::neu();
        let c = ConnectionId::new();
        dir.beitreten(c, pid("u1"), Role::Mentor);
        let beitritt = dir.beitreten(c, pid("u1"), Role::Mentee);
        assert_eq!(beitritt, Some(Beitritt::default()));
        assert_eq!(dir.rolle_von(&pid("u1")), Some(Role::Mentee));
        assert_eq!(dir.anzahl(), 1);
    }

    #[test]
    fn leere_id_wird_ignoriert() {
        let dir = Directory::neu();
        let c = ConnectionId::new();
        assert_eq!(dir.beitreten(c, pid(""), Role::Mentee), None);
        assert_eq!(dir.anzahl(), 0);
        assert_eq!(dir.teilnehmer_von(c), None);
    }

    #[test]
    fn verlassen_entfernt_eintrag() {
        let dir = Directory::neu();
        let c = ConnectionId::new();
        dir.beitreten(c, pid("u1"), Role::Mentee);

        assert_eq!(dir.verlassen(c), Some(pid("u1")));
        assert_eq!(dir.rolle_von(&pid("u1")), None);
        assert_eq!(dir.anzahl(), 0);
    }

    #[test]
    fn verlassen_ist_idempotent() {
        let dir = Directory::neu();
        let c = ConnectionId::new();
        dir.beitreten(c, pid("u1"), Role::Mentee);

        assert!(dir.verlassen(c).is_some());
        assert!(dir.verlassen(c).is_none());
    }

    #[test]
    fn verlassen_ohne_beitritt() {
        let dir = Directory::neu();
        assert_eq!(dir.verlassen(ConnectionId::new()), None);
    }

    #[test]
    fn uebernommene_id_bleibt_beim_neuen_besitzer() {
        let dir = Directory::neu();
        let alt = ConnectionId::new();
        let neu = ConnectionId::new();

        dir.beitreten(alt, pid("u1"), Role::Mentor);
        let beitritt = dir.beitreten(neu, pid("u1"), Role::Mentee).unwrap();
        assert_eq!(beitritt.verdraengt, Some(alt));
        assert_eq!(beitritt.abgeloest, None);

        assert_eq!(dir.teilnehmer_von(alt), None);
        assert_eq!(dir.verlassen(alt), None);
        assert_eq!(dir.rolle_von(&pid("u1")), Some(Role::Mentee));
        assert_eq!(dir.eintrag(&pid("u1")).map(|e| e.besitzer), Some(neu));

        assert_eq!(dir.verlassen(neu), Some(pid("u1")));
    }

    #[test]
    fn neue_id_ersetzt_alte_bindung() {
        let dir = Directory::neu();
        let c = ConnectionId::new();

        dir.beitreten(c, pid("u1"), Role::Mentee);
        let beitritt = dir.beitreten(c, pid("u2"), Role::Mentee).unwrap();
        assert_eq!(beitritt.abgeloest, Some(pid("u1")));
        assert_eq!(beitritt.verdraengt, None);

        assert_eq!(dir.rolle_von(&pid("u1")), None);
        assert_eq!(dir.teilnehmer_von(c), Some(pid("u2")));
        assert_eq!(dir.anzahl(), 1);
    }

    #[test]
    fn neue_id_laesst_fremden_eintrag_stehen() {
        let dir = Directory::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        dir.beitreten(a, pid("u1"), Role::Mentee);
        dir.beitreten(b, pid("u1"), Role::Mentor);
        // a ist nicht mehr gebunden, ein neuer Beitritt darf u1 nicht loeschen
        dir.beitreten(a, pid("u2"), Role::Mentee);

        assert_eq!(dir.rolle_von(&pid("u1")), Some(Role::Mentor));
        assert_eq!(dir.anzahl(), 2);
    }

    #[test]
    fn paralleler_zugriff() {
        use std::sync::Arc;

        let dir = Arc::new(Directory::neu());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = Arc::clone(&dir);
                std::thread::spawn(move || {
                    let c = ConnectionId::new();
                    for _ in 0..100 {
                        dir.beitreten(c, pid(&format!("u{i}")), Role::Mentee);
                        dir.verlassen(c);
                    }
                    dir.beitreten(c, pid(&format!("u{i}")), Role::Mentor);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(dir.anzahl(), 8);
    }
}
