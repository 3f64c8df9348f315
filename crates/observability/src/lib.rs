//! # duett-observability
//!
//! Observability-Crate fuer Duett:
//! - Prometheus-kompatible Metriken der Vermittlung (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Tracing fuer HTTP

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, DuettMetriken};
pub use middleware::request_timing_layer;

use axum::Router;

/// Baut den Observability-Router (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics` – Prometheus scrape format
/// - `GET /health`  – Health-Check JSON
pub fn observability_router(metriken: DuettMetriken, health: HealthState) -> Router {
    Router::new()
        .merge(metrics_router(metriken))
        .merge(health_router(health))
}
