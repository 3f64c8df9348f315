//! Wire-Format fuer WebSocket-Verbindungen
//!
//! Jeder WebSocket-Text-Frame enthaelt genau ein JSON-Event.
//!
//! ## Frame-Format
//!
//! ```text
//! {"event": "signal", "data": {"to": "<peer-id>", "data": { ... }}}
//! ```
//!
//! Die maximale Groesse eingehender Frames ist konfigurierbar (Standard:
//! 64 KB). Zu grosse Frames werden abgelehnt ohne sie zu parsen.
//! Ausgehende Events sind nicht begrenzt: ein weitergeleitetes Event ist
//! immer etwas groesser als die Anfrage, die es ausgeloest hat.

use thiserror::Error;

use crate::control::{ClientEvent, ServerEvent};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (64 KB)
///
/// SDP-Offers mit vielen Codecs liegen bei wenigen KB.
pub const DEFAULT_MAX_NACHRICHT_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler beim Dekodieren oder Kodieren eines Frames
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Frame ueberschreitet die maximale Groesse
    #[error("Frame zu gross: {laenge} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { laenge: usize, maximum: usize },

    /// Kein gueltiges JSON bzw. kein Event-Umschlag
    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    /// Event-Name ist unbekannt
    #[error("Unbekanntes Event: {0}")]
    UnbekanntesEvent(String),

    /// Event bekannt, Nutzlast aber unvollstaendig oder falsch typisiert
    #[error("Ungueltige Nutzlast fuer '{event}': {grund}")]
    UngueltigeNutzlast { event: String, grund: String },
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// Codec fuer JSON-Text-Frames
///
/// Dekodiert `ClientEvent`s mit Groessenlimit und kodiert `ServerEvent`s.
#[derive(Debug, Clone)]
pub struct TextCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_nachricht_bytes: usize,
}

impl TextCodec {
    /// Erstellt einen neuen `TextCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
        }
    }

    /// Erstellt einen `TextCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_nachricht_bytes: usize) -> Self {
        Self {
            max_nachricht_bytes,
        }
    }

    /// Gibt die konfigurierte maximale Groesse eingehender Frames zurueck
    pub fn max_nachricht_bytes(&self) -> usize {
        self.max_nachricht_bytes
    }

    /// Dekodiert einen eingehenden Text-Frame
    pub fn dekodieren(&self, frame: &str) -> Result<ClientEvent, ProtokollFehler> {
        self.groesse_pruefen(frame.len())?;
        ClientEvent::from_json(frame)
    }

    /// Kodiert ein ausgehendes Event als Text-Frame
    pub fn kodieren(&self, event: &ServerEvent) -> Result<String, ProtokollFehler> {
        Ok(event.to_json()?)
    }

    fn groesse_pruefen(&self, laenge: usize) -> Result<(), ProtokollFehler> {
        if laenge > self.max_nachricht_bytes {
            return Err(ProtokollFehler::ZuGross {
                laenge,
                maximum: self.max_nachricht_bytes,
            });
        }
        Ok(())
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
