//! Duett Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use duett_observability::logging_initialisieren;
use duett_server::{config::ServerConfig, Server};

/// Umgebungsvariable fuer den Pfad der Konfigurationsdatei
const ENV_CONFIG: &str = "DUETT_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var(ENV_CONFIG).unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let geladen = ServerConfig::laden(&config_pfad)?;
    let datei_fehlt = geladen.is_none();
    let config = geladen.unwrap_or_default();

    // Logging initialisieren, danach erst Warnungen aus der Konfiguration
    logging_initialisieren(&config.logging.level, &config.logging.format);
    if datei_fehlt {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }
    let config = config.mit_umgebung();
    config.validieren();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Duett Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
