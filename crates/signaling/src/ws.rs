//! WebSocket-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! `GET /ws` wird per `WebSocketUpgrade` angenommen; jede Verbindung
//! bekommt eine frische `PeerId` und laeuft als eigener Task mit einer
//! `ClientConnection`. Alle anderen Pfade fallen auf die statischen
//! Dateien zurueck (falls konfiguriert).

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use duett_core::PeerId;
use duett_observability::request_timing_layer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::connection::ClientConnection;
use crate::error::SignalingResult;
use crate::server_state::{SignalingConfig, SignalingState};

/// Faktor zwischen Codec-Limit und Transport-Limit
///
/// Frames bis zum Codec-Limit werden verarbeitet, groessere bis zum
/// Transport-Limit ignoriert. Alles darueber beendet die Verbindung.
pub const TRANSPORT_LIMIT_FAKTOR: usize = 4;

/// Maximale WebSocket-Nachrichten- und Frame-Groesse
pub fn transport_limit(max_nachricht_bytes: usize) -> usize {
    max_nachricht_bytes.saturating_mul(TRANSPORT_LIMIT_FAKTOR)
}

/// Zustand des WebSocket-Handlers
#[derive(Clone)]
pub struct WsZustand {
    pub state: Arc<SignalingState>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Baut den Router mit `/ws` und optionalem Static-Fallback
pub fn router(state: Arc<SignalingState>, shutdown_rx: watch::Receiver<bool>) -> Router {
    let verzeichnis = state.config.statisches_verzeichnis.clone();

    let router = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(WsZustand { state, shutdown_rx });

    match verzeichnis {
        Some(verzeichnis) => router.fallback_service(ServeDir::new(verzeichnis)),
        None => router,
    }
}

/// CORS- und Tracing-Layer fuer die gesamte App
pub fn layer_anwenden(app: Router, config: &SignalingConfig) -> Router {
    app.layer(cors_layer(&config.cors_origins))
        .layer(request_timing_layer())
}

/// Leere Origin-Liste oder `*` erlaubt jede Origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::permissive();
    }

    let erlaubt: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(wert) => Some(wert),
            Err(_) => {
                tracing::warn!(origin = %o, "Ungueltige CORS-Origin ignoriert");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(erlaubt))
        .allow_methods([Method::GET])
        .allow_headers(Any)
}

/// `GET /ws` – WebSocket-Upgrade
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(zustand): State<WsZustand>,
) -> Response {
    let platz = match zustand.state.annahme_pruefen() {
        Ok(platz) => platz,
        Err(e) => {
            tracing::warn!(addr = %addr, fehler = %e, "Verbindung abgelehnt");
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };

    let limit = transport_limit(zustand.state.config.max_nachricht_bytes);
    let verbindung =
        ClientConnection::neu(Arc::clone(&zustand.state), PeerId::new(), addr, platz);
    let shutdown_rx = zustand.shutdown_rx.clone();

    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| verbindung.verarbeiten(socket, shutdown_rx))
}

/// WebSocket-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
    bind_addr: SocketAddr,
}

impl SignalingServer {
    /// Erstellt einen neuen SignalingServer
    pub fn neu(state: Arc<SignalingState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Bindet den Listener und bedient `app` bis zum Shutdown-Signal
    ///
    /// `app` enthaelt mindestens den Router aus [`router`]; CORS und
    /// Request-Tracing werden hier fuer alle Routen angewendet.
    pub async fn starten(
        self,
        app: Router,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        let app = layer_anwenden(app, &self.state.config);
        bedienen(listener, app, shutdown_rx).await
    }
}

/// Bedient `app` auf einem bereits gebundenen Listener
pub async fn bedienen(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> SignalingResult<()> {
    let lokale_addr = listener.local_addr()?;
    tracing::info!(adresse = %lokale_addr, "WebSocket Signaling-Server gestartet");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
        tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
    })
    .await?;

    tracing::info!("Signaling-Server beendet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use duett_observability::DuettMetriken;
    use tower::ServiceExt;

    fn state(config: SignalingConfig) -> Arc<SignalingState> {
        SignalingState::neu(config, DuettMetriken::neu().unwrap())
    }

    #[tokio::test]
    async fn unbekannter_pfad_ohne_static_ist_404() {
        let (_tx, rx) = watch::channel(false);
        let app = router(state(SignalingConfig::default()), rx);
        let antwort = app
            .oneshot(Request::builder().uri("/nichts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_erlaubt_jede_origin_ohne_liste() {
        let (_tx, rx) = watch::channel(false);
        let state = state(SignalingConfig::default());
        let config = Arc::clone(&state.config);
        let app = layer_anwenden(router(state, rx), &config);

        let antwort = app
            .oneshot(
                Request::builder()
                    .uri("/nichts")
                    .header("origin", "http://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            antwort.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn transport_limit_liegt_ueber_codec_limit() {
        assert_eq!(transport_limit(1024), 4096);
        assert_eq!(transport_limit(usize::MAX), usize::MAX);
    }

    #[test]
    fn ungueltige_origins_werden_ignoriert() {
        // Darf nicht paniken
        let _ = cors_layer(&["http://ok.example".into(), "\u{7f}kaputt".into()]);
        let _ = cors_layer(&["*".into()]);
    }
}
