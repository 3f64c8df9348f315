//! duett-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Duett-Crates gemeinsam genutzt werden: Peer- und Raum-IDs,
//! die Rollen eines Gespraechs und der zentrale Fehlertyp.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{DuettError, Result};
pub use types::{PeerId, RoomId, Rolle};
