//! Gemeinsame Identifikationstypen fuer Duett
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Peer- und Raum-IDs zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trennzeichen zwischen den beiden Peer-IDs einer Raum-ID
pub const RAUM_TRENNER: char = '#';

/// Eindeutige Peer-ID (eine pro Verbindung)
///
/// Wird beim Verbindungsaufbau vom Transport-Layer vergeben und ist fuer
/// die gesamte Lebensdauer der Verbindung gueltig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Erstellt eine neue zufaellige PeerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PeerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Raum-ID – `<caller>#<callee>`
///
/// Die Reihenfolge dient nur der Lesbarkeit. Raeume werden nie
/// wiederverwendet, eine neue Paarung derselben Peers ergibt einen neuen Raum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Bildet die Raum-ID aus den beiden Peers einer Paarung
    pub fn aus_paar(caller: PeerId, callee: PeerId) -> Self {
        Self(format!("{}{}{}", caller.0, RAUM_TRENNER, callee.0))
    }

    /// Gibt die Raum-ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leere Raum-IDs sind fuer den Relay gleichbedeutend mit "kein Raum"
    pub fn ist_leer(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Rolle eines Peers in einem Raum
///
/// Der Peer der zuerst gewartet hat wird `Caller` und erstellt das Offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rolle {
    Caller,
    Callee,
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Caller => f.write_str("caller"),
            Self::Callee => f.write_str("callee"),
        }
    }
}
