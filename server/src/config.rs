//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Die Umgebungsvariable `PORT` ueberschreibt den Port.

use anyhow::Context;
use duett_observability::logging::{log_format_gueltig, log_level_gueltig};
use duett_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Umgebungsvariable, die `netzwerk.port` ueberschreibt
pub const ENV_PORT: &str = "PORT";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Verbindungs-Einstellungen (Keepalive, Queues, Frame-Groesse)
    pub verbindung: VerbindungsEinstellungen,
    /// Statische Dateien
    pub statisch: StatischEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Peers
    pub max_peers: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Duett".into(),
            max_peers: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub port: u16,
    /// Erlaubte CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 4000,
            cors_origins: vec![],
        }
    }
}

/// Verbindungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Keepalive-Ping-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Trennen nach so vielen Sekunden ohne eingehenden Frame
    pub verbindungs_timeout_sek: u64,
    /// Groesse der Send-Queue pro Peer
    pub sende_queue_groesse: usize,
    /// Maximale Groesse eines eingehenden Text-Frames in Bytes
    pub max_nachricht_bytes: usize,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        let standard = SignalingConfig::default();
        Self {
            keepalive_sek: standard.keepalive_sek,
            verbindungs_timeout_sek: standard.verbindungs_timeout_sek,
            sende_queue_groesse: standard.sende_queue_groesse,
            max_nachricht_bytes: standard.max_nachricht_bytes,
        }
    }
}

/// Statische Dateien (Web-Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatischEinstellungen {
    /// Verzeichnis (leer = keine Auslieferung)
    pub verzeichnis: Option<String>,
}

impl Default for StatischEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: Some("public".into()),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Haengt `/metrics` und `/health` an den Router
    pub aktiviert: bool,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self { aktiviert: true }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// `None` wenn die Datei nicht existiert; der Aufrufer entscheidet ueber
    /// Standardwerte und meldet das erst, wenn das Logging steht.
    pub fn laden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Wendet Umgebungs-Overrides an (`PORT`)
    pub fn mit_umgebung(self) -> Self {
        let port = std::env::var(ENV_PORT).ok();
        self.mit_port_override(port.as_deref())
    }

    /// Ueberschreibt den Port, falls `wert` eine gueltige Portnummer ist
    pub fn mit_port_override(mut self, wert: Option<&str>) -> Self {
        if let Some(wert) = wert {
            match wert.trim().parse::<u16>() {
                Ok(port) => self.netzwerk.port = port,
                Err(_) => {
                    tracing::warn!(wert = wert, "Ungueltiger {ENV_PORT}-Wert ignoriert");
                }
            }
        }
        self
    }

    /// Warnt bei Werten, die stillschweigend auf Standards zurueckfallen
    pub fn validieren(&self) -> bool {
        let mut gueltig = true;
        if !log_level_gueltig(&self.logging.level) {
            tracing::warn!(level = %self.logging.level, "Unbekannter Log-Level");
            gueltig = false;
        }
        if !log_format_gueltig(&self.logging.format) {
            tracing::warn!(format = %self.logging.format, "Unbekanntes Log-Format, verwende text");
            gueltig = false;
        }
        if self.verbindung.keepalive_sek >= self.verbindung.verbindungs_timeout_sek {
            tracing::warn!(
                keepalive = self.verbindung.keepalive_sek,
                timeout = self.verbindung.verbindungs_timeout_sek,
                "Keepalive-Intervall nicht kleiner als Timeout"
            );
            gueltig = false;
        }
        gueltig
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port);
        adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{adresse}'"))
    }

    /// Baut die Konfiguration fuer den Signaling-Service
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            max_peers: self.server.max_peers,
            keepalive_sek: self.verbindung.keepalive_sek,
            verbindungs_timeout_sek: self.verbindung.verbindungs_timeout_sek,
            sende_queue_groesse: self.verbindung.sende_queue_groesse,
            max_nachricht_bytes: self.verbindung.max_nachricht_bytes,
            statisches_verzeichnis: self
                .statisch
                .verzeichnis
                .clone()
                .filter(|v| !v.trim().is_empty()),
            cors_origins: self.netzwerk.cors_origins.clone(),
        }
    }
}
