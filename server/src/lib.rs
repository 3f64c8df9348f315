//! duett-server – Bibliotheks-Root
//!
//! Verdrahtet Vermittlung, WebSocket-Router, Observability und
//! statische Dateien zu einem laufenden Server.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use duett_observability::{observability_router, DuettMetriken};
use duett_signaling::{ws, SignalingServer, SignalingState};
use std::sync::Arc;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Metriken und Vermittlung anlegen
    /// 2. Router aus `/ws`, `/metrics`, `/health` und statischen Dateien bauen
    /// 3. Listener binden und bedienen
    /// 4. Auf Ctrl-C warten, dann Verbindungen schliessen
    pub async fn starten(self) -> Result<()> {
        let bind_addr = self.config.bind_adresse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %bind_addr,
            max_peers = self.config.server.max_peers,
            "Server startet"
        );

        let metriken = DuettMetriken::neu().context("Metriken konnten nicht angelegt werden")?;
        let state = SignalingState::neu(self.config.signaling_config(), metriken.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut app = ws::router(Arc::clone(&state), shutdown_rx.clone());
        if self.config.observability.aktiviert {
            app = app.merge(observability_router(metriken, state.health.clone()));
        }

        // Ctrl-C -> keine neuen Verbindungen, bestehende schliessen
        let health = state.health.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
                return;
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            health.annahme_setzen(false);
            let _ = shutdown_tx.send(true);
        });

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        SignalingServer::neu(state, bind_addr)
            .starten(app, shutdown_rx)
            .await
            .context("Signaling-Server beendet mit Fehler")?;

        Ok(())
    }
}
