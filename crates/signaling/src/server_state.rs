//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Konfiguration, Vermittlung und Observability-Handles als
//! Arc-Referenzen, die sicher zwischen tokio-Tasks geteilt werden koennen.

use duett_observability::{DuettMetriken, HealthState};
use duett_protocol::wire::DEFAULT_MAX_NACHRICHT_BYTES;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{SignalingError, SignalingResult};
use crate::registry::SEND_QUEUE_GROESSE;
use crate::vermittlung::Vermittlung;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Maximale gleichzeitige Peers
    pub max_peers: usize,
    /// Keepalive-Intervall in Sekunden (WebSocket-Ping)
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Groesse der Send-Queue pro Peer
    pub sende_queue_groesse: usize,
    /// Maximale Groesse eines eingehenden Text-Frames
    pub max_nachricht_bytes: usize,
    /// Verzeichnis fuer statische Dateien (None = keine Auslieferung)
    pub statisches_verzeichnis: Option<String>,
    /// Erlaubte CORS-Origins (leer = alle)
    pub cors_origins: Vec<String>,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_peers: 512,
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            sende_queue_groesse: SEND_QUEUE_GROESSE,
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
            statisches_verzeichnis: None,
            cors_origins: Vec::new(),
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Registry, Warteplatz und Raeume
    pub vermittlung: Vermittlung,
    /// Prometheus-Metriken
    pub metriken: DuettMetriken,
    /// Health-Zustand (Annahme neuer Verbindungen, Uptime)
    pub health: HealthState,
    /// Reservierte Verbindungsplaetze (angenommen, noch nicht beendet)
    belegte_plaetze: Arc<AtomicUsize>,
}

/// Reservierter Verbindungsplatz
///
/// Wird beim Upgrade vergeben und beim Drop freigegeben.
#[derive(Debug)]
pub struct Platz {
    belegt: Arc<AtomicUsize>,
}

impl Drop for Platz {
    fn drop(&mut self) {
        self.belegt.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig, metriken: DuettMetriken) -> Arc<Self> {
        let vermittlung = Vermittlung::neu(config.sende_queue_groesse, metriken.clone());
        let health = HealthState::neu(metriken.clone());
        Arc::new(Self {
            config: Arc::new(config),
            vermittlung,
            metriken,
            health,
            belegte_plaetze: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Prueft ob eine neue Verbindung angenommen werden darf und
    /// reserviert dabei atomar einen der `max_peers` Plaetze
    pub fn annahme_pruefen(&self) -> SignalingResult<Platz> {
        if !self.health.nimmt_an() {
            return Err(SignalingError::Herunterfahren);
        }
        let max = self.config.max_peers;
        self.belegte_plaetze
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map_err(|_| SignalingError::ServerVoll)?;
        Ok(Platz {
            belegt: Arc::clone(&self.belegte_plaetze),
        })
    }

    /// Anzahl aktuell reservierter Plaetze
    pub fn belegte_plaetze(&self) -> usize {
        self.belegte_plaetze.load(Ordering::Acquire)
    }
}
