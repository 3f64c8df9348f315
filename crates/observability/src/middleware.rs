//! Request-Tracing Middleware fuer Axum
//!
//! Protokolliert jede HTTP-Anfrage (inklusive WebSocket-Upgrade) als
//! tracing-Span mit Methode, Pfad, Statuscode und Dauer.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;

/// Erstellt den Axum-Layer fuer Request-Tracing.
pub fn request_timing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}
