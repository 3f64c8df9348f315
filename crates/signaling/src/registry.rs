//! Verbindungs-Registry – Wer ist verbunden, in welchem Raum, mit welcher Rolle
//!
//! Die Registry haelt pro Peer die Send-Queue sowie die aktuelle
//! Raumzugehoerigkeit und die Raumtabelle selbst. Sie ist nicht
//! thread-safe; der Aufrufer haelt sie hinter dem Vermittlungs-Lock.

use duett_core::{DuettError, PeerId, Rolle, RoomId};
use duett_protocol::ServerEvent;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Peer
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// PeerSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Peers
#[derive(Clone, Debug)]
pub struct PeerSender {
    pub peer_id: PeerId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl PeerSender {
    /// Reiht ein Event nicht-blockierend in die Send-Queue ein
    pub fn senden(&self, event: ServerEvent) -> duett_core::Result<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(peer_id = %self.peer_id, "Send-Queue voll – Event verworfen");
                Err(DuettError::QueueVoll(self.peer_id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(peer_id = %self.peer_id, "Send-Queue geschlossen (Peer getrennt)");
                Err(DuettError::QueueGeschlossen(self.peer_id))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Eintraege
// ---------------------------------------------------------------------------

/// Registry-Eintrag eines verbundenen Peers
#[derive(Debug)]
pub struct PeerEintrag {
    pub sender: PeerSender,
    pub raum: Option<RoomId>,
    pub rolle: Option<Rolle>,
}

/// Ein aktiver Zweier-Raum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raum {
    pub id: RoomId,
    pub caller: PeerId,
    pub callee: PeerId,
}

impl Raum {
    /// Gibt das andere Mitglied zurueck, `None` wenn `peer` kein Mitglied ist
    pub fn partner_von(&self, peer: &PeerId) -> Option<PeerId> {
        if *peer == self.caller {
            Some(self.callee)
        } else if *peer == self.callee {
            Some(self.caller)
        } else {
            None
        }
    }

    pub fn enthaelt(&self, peer: &PeerId) -> bool {
        self.partner_von(peer).is_some()
    }
}

// ---------------------------------------------------------------------------
// VerbindungsRegistry
// ---------------------------------------------------------------------------

/// Registry aller verbundenen Peers und aktiven Raeume
#[derive(Debug)]
pub struct VerbindungsRegistry {
    peers: HashMap<PeerId, PeerEintrag>,
    raeume: HashMap<RoomId, Raum>,
    queue_groesse: usize,
}

impl Default for VerbindungsRegistry {
    fn default() -> Self {
        Self::neu(SEND_QUEUE_GROESSE)
    }
}

impl VerbindungsRegistry {
    /// Erstellt eine leere Registry
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            peers: HashMap::new(),
            raeume: HashMap::new(),
            queue_groesse: queue_groesse.max(1),
        }
    }

    /// Registriert einen Peer und gibt seine Empfangs-Queue zurueck
    pub fn registrieren(&mut self, peer_id: PeerId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.queue_groesse);
        self.peers.insert(
            peer_id,
            PeerEintrag {
                sender: PeerSender { peer_id, tx },
                raum: None,
                rolle: None,
            },
        );
        tracing::debug!(peer_id = %peer_id, "Peer registriert");
        rx
    }

    /// Entfernt einen Peer und gibt seinen letzten Raum zurueck
    ///
    /// Mehrfacher Aufruf ist ein No-op.
    pub fn abmelden(&mut self, peer_id: &PeerId) -> Option<RoomId> {
        let eintrag = self.peers.remove(peer_id)?;
        tracing::debug!(peer_id = %peer_id, "Peer abgemeldet");
        eintrag.raum
    }

    /// Loest eine Peer-ID zu ihrem Sender auf
    pub fn aufloesen(&self, peer_id: &PeerId) -> duett_core::Result<&PeerSender> {
        self.peers
            .get(peer_id)
            .map(|e| &e.sender)
            .ok_or(DuettError::PeerNichtVerbunden(*peer_id))
    }

    pub fn ist_registriert(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// Aktueller Raum eines Peers
    pub fn raum_von(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.peers.get(peer_id).and_then(|e| e.raum.as_ref())
    }

    /// Aktuelle Rolle eines Peers
    pub fn rolle_von(&self, peer_id: &PeerId) -> Option<Rolle> {
        self.peers.get(peer_id).and_then(|e| e.rolle)
    }

    /// Legt einen Raum an und traegt Raum und Rolle bei beiden Mitgliedern ein
    pub fn raum_anlegen(&mut self, raum: Raum) {
        for (peer, rolle) in [(raum.caller, Rolle::Caller), (raum.callee, Rolle::Callee)] {
            if let Some(eintrag) = self.peers.get_mut(&peer) {
                eintrag.raum = Some(raum.id.clone());
                eintrag.rolle = Some(rolle);
            }
        }
        tracing::debug!(raum = %raum.id, "Raum angelegt");
        self.raeume.insert(raum.id.clone(), raum);
    }

    /// Loest einen Raum auf und loescht Raum und Rolle bei allen Mitgliedern
    pub fn raum_aufloesen(&mut self, raum_id: &RoomId) -> Option<Raum> {
        let raum = self.raeume.remove(raum_id)?;
        for peer in [raum.caller, raum.callee] {
            if let Some(eintrag) = self.peers.get_mut(&peer) {
                if eintrag.raum.as_ref() == Some(raum_id) {
                    eintrag.raum = None;
                    eintrag.rolle = None;
                }
            }
        }
        tracing::debug!(raum = %raum_id, "Raum aufgeloest");
        Some(raum)
    }

    pub fn raum(&self, raum_id: &RoomId) -> Option<&Raum> {
        self.raeume.get(raum_id)
    }

    /// Sendet ein Event an einen Peer
    pub fn senden(&self, peer_id: &PeerId, event: ServerEvent) -> duett_core::Result<()> {
        self.aufloesen(peer_id)?.senden(event)
    }

    /// Anzahl verbundener Peers
    pub fn anzahl(&self) -> usize {
        self.peers.len()
    }

    /// Anzahl aktiver Raeume
    pub fn raum_anzahl(&self) -> usize {
        self.raeume.len()
    }
}
