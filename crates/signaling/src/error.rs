//! Fehlertypen fuer den Signaling-Service

use duett_core::DuettError;
use duett_protocol::ProtokollFehler;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Listener, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Frame konnte nicht dekodiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),

    /// Vermittlung hat das Event abgelehnt
    #[error("Vermittlungsfehler: {0}")]
    Vermittlung(#[from] DuettError),

    /// Server ist voll
    #[error("Server ist voll")]
    ServerVoll,

    /// Server faehrt herunter
    #[error("Server faehrt herunter")]
    Herunterfahren,
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
