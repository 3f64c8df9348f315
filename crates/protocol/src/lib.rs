//! duett-protocol – Signaling-Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Events die zwischen Browser-Client und
//! Server ueber die WebSocket-Verbindung ausgetauscht werden, sowie den
//! JSON-Text-Codec fuer einzelne Frames.

pub mod control;
pub mod wire;

pub use control::{
    ChatAnfrage, ChatNachricht, ClientEvent, ServerEvent, SignalAnfrage, TippAnfrage,
};
pub use wire::{ProtokollFehler, TextCodec};
