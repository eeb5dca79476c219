use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use tracing::{debug, info};

use super::charts::parse_range;
use crate::processor::{self, Period};
use crate::{Dataset, SharedState};

// ---

pub fn router() -> Router<SharedState> {
    // ---
    Router::new().route("/api/aggregate", get(handler))
}

/// Query parameters for resampled readings
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    /// Bucket width, e.g. "H", "15min", "1D" (default hourly)
    period: Option<String>,
    /// Optional chart window ("1H", "6H", "24H", "7D"); whole dataset when absent
    range: Option<String>,
}

async fn handler(
    Query(params): Query<AggregateQuery>,
    State(state): State<SharedState>,
) -> Response {
    // ---
    let period = match params.period.as_deref().map(str::parse::<Period>) {
        None => Period::default(),
        Some(Ok(period)) => period,
        Some(Err(e)) => {
            info!("GET /api/aggregate - rejected period: {}", e);
            return (StatusCode::BAD_REQUEST, Json(e.to_string())).into_response();
        }
    };

    let Some(dataset) = state.snapshot().await.dataset else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let window = match params.range.as_deref() {
        Some(raw) => {
            let start = parse_range(Some(raw)).start(Local::now().naive_local());
            Dataset {
                readings: dataset.since(start).to_vec(),
                dropped_rows: dataset.dropped_rows,
            }
        }
        None => Dataset::clone(&dataset),
    };

    debug!("GET /api/aggregate - {} readings into {} buckets", window.len(), period);
    match processor::aggregate(&window, period) {
        Some(aggregated) => (StatusCode::OK, Json(aggregated)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
