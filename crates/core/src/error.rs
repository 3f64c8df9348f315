//! Fehlertypen fuer Duett
//!
//! Zentraler Fehler-Enum fuer die Vermittlung. Keiner dieser Fehler ist
//! fuer den Server-Prozess fatal – sie werden lokal geloggt und verworfen.

use thiserror::Error;

use crate::types::{PeerId, RoomId};

/// Globaler Result-Alias fuer Duett
pub type Result<T> = std::result::Result<T, DuettError>;

/// Alle moeglichen Fehler im Duett-System
#[derive(Debug, Error)]
pub enum DuettError {
    // --- Peers & Raeume ---
    #[error("Peer nicht verbunden: {0}")]
    PeerNichtVerbunden(PeerId),

    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(RoomId),

    #[error("Peer {peer} ist kein Mitglied von Raum {raum}")]
    KeinMitglied { peer: PeerId, raum: RoomId },

    #[error("Nachricht ohne Raum-ID")]
    OhneRaum,

    // --- Zustellung ---
    #[error("Send-Queue voll: {0}")]
    QueueVoll(PeerId),

    #[error("Send-Queue geschlossen: {0}")]
    QueueGeschlossen(PeerId),
}

impl DuettError {
    /// Gibt true zurueck wenn der Empfaenger nicht (mehr) erreichbar ist
    ///
    /// Solche Nachrichten werden still verworfen.
    pub fn ist_unzustellbar(&self) -> bool {
        matches!(
            self,
            Self::PeerNichtVerbunden(_) | Self::QueueVoll(_) | Self::QueueGeschlossen(_)
        )
    }
}
