//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task. Eingehende Frames
//! werden der Reihe nach dekodiert und dispatcht, ausgehende Events kommen
//! aus der Send-Queue der Registry.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen WebSocket-Ping
//! - Kommt `verbindungs_timeout_sek` lang kein Frame, wird getrennt
//!
//! Auf jedem Ausgang der Schleife laeuft der Verbindungsabbau genau einmal.

use axum::extract::ws::{Message, WebSocket};
use duett_core::PeerId;
use duett_protocol::TextCodec;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::dispatcher::MessageDispatcher;
use crate::error::SignalingResult;
use crate::server_state::{Platz, SignalingState};

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_id: PeerId,
    peer_addr: SocketAddr,
    /// Wird mit der Verbindung freigegeben
    _platz: Platz,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(
        state: Arc<SignalingState>,
        peer_id: PeerId,
        peer_addr: SocketAddr,
        platz: Platz,
    ) -> Self {
        Self {
            state,
            peer_id,
            peer_addr,
            _platz: platz,
        }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, der Keepalive ablaeuft oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(self, socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_id = self.peer_id;
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek.max(1));
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        tracing::info!(peer = %peer_id, addr = %peer_addr, "Neue Verbindung");

        let (mut ws_tx, mut ws_rx) = socket.split();
        let mut sende_rx = self.state.vermittlung.verbinden(peer_id);
        let codec = TextCodec::with_max_size(self.state.config.max_nachricht_bytes);
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        let mut letzter_empfang = Instant::now();
        let mut keepalive = tokio::time::interval_at(
            tokio::time::Instant::now() + keepalive_intervall,
            keepalive_intervall,
        );

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            letzter_empfang = Instant::now();
                            if let Err(e) = self.frame_verarbeiten(&codec, &dispatcher, &text) {
                                tracing::debug!(peer = %peer_id, fehler = %e, "Frame ignoriert");
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(peer = %peer_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Ping, Pong, Binary: nur Lebenszeichen
                            letzter_empfang = Instant::now();
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_id, fehler = %e, "WebSocket-Lesefehler");
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus der Send-Queue
                Some(event) = sende_rx.recv() => {
                    let text = match codec.kodieren(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(peer = %peer_id, fehler = %e, "Event nicht kodierbar");
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        tracing::warn!(peer = %peer_id, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Keepalive-Ping und Timeout-Pruefung
                _ = keepalive.tick() => {
                    if letzter_empfang.elapsed() > timeout_dauer {
                        tracing::warn!(peer = %peer_id, "Verbindungs-Timeout");
                        break;
                    }
                    if let Err(e) = ws_tx.send(Message::Ping(Vec::new())).await {
                        tracing::warn!(peer = %peer_id, fehler = %e, "Ping-Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_id, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        let abbau = self.state.vermittlung.trennen(peer_id);
        tracing::info!(
            peer = %peer_id,
            partner = ?abbau.partner,
            "Verbindungs-Task beendet"
        );
    }

    /// Dekodiert einen Text-Frame und reicht ihn an den Dispatcher
    fn frame_verarbeiten(
        &self,
        codec: &TextCodec,
        dispatcher: &MessageDispatcher,
        text: &str,
    ) -> SignalingResult<()> {
        let event = codec.dekodieren(text).inspect_err(|_| {
            self.state.metriken.ungueltige_frames_total.inc();
        })?;
        dispatcher.dispatch(event, self.peer_id)
    }
}
