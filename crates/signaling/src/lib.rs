//! duett-signaling – WebSocket-Signaling und Vermittlung
//!
//! Dieser Crate implementiert die Paarung anonymer Peers zu Zweier-Raeumen
//! und leitet Signale, Chat und Tipp-Status zwischen den beiden Mitgliedern
//! eines Raums weiter.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Listener (SignalingServer, GET /ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  id_assigned -> select!(Frames, Send-Queue, Keepalive, Shutdown)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     v
//! Vermittlung (ein Mutex)
//!     +-- Matchmaker      (join)
//!     +-- Relay           (signal, send_message, typing, stop_typing)
//!     +-- Lebenszyklus    (leave, Verbindungsabbruch)
//!     |
//!     +-- VerbindungsRegistry – Peers, Send-Queues, Raeume, Rollen
//!     +-- Warteplatz          – hoechstens ein wartender Peer
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod lebenszyklus;
pub mod matchmaker;
pub mod registry;
pub mod relay;
pub mod server_state;
pub mod vermittlung;
pub mod warteplatz;
pub mod ws;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use lebenszyklus::{Abbau, Abgang};
pub use matchmaker::Beitritt;
pub use registry::VerbindungsRegistry;
pub use server_state::{SignalingConfig, SignalingState};
pub use vermittlung::Vermittlung;
pub use warteplatz::Warteplatz;
pub use ws::SignalingServer;
