// src/routes/health.rs
//! Liveness probe for the dashboard service.
//!
//! This module defines the `/health` route used by container orchestrators
//! and uptime checks to verify that the service is running and able to
//! respond to HTTP requests. It is a sibling module in the `routes`
//! directory and follows the Explicit Module Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the `/health` route
//!
//! Whether upstream data is fresh is reported by `/api/status`, not here.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object. Does not take the shared state lock or
/// contact the sensor API.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router whatever the state type is.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
