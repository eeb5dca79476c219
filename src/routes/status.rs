use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::Snapshot;
use crate::{processor, SharedState, Statistics};

// ---

pub fn router() -> Router<SharedState> {
    // ---
    Router::new().route("/api/status", get(handler))
}

/// Status line shown above the charts.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    // ---
    pub has_data: bool,
    /// `%Y-%m-%d %H:%M:%S` of the last successful publish.
    pub last_updated: Option<String>,
    /// Error text of the last failed refresh, otherwise "Active".
    pub status: String,
    pub healthy: bool,
    pub stats: Option<Statistics>,
}

async fn handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    // ---
    let snapshot = state.snapshot().await;
    debug!("GET /api/status");
    Json(build_status(&snapshot))
}

pub(crate) fn build_status(snapshot: &Snapshot) -> StatusResponse {
    // ---
    let healthy = snapshot.error.is_none();
    let dataset = match snapshot.dataset.as_deref() {
        Some(dataset) if !dataset.is_empty() => dataset,
        _ => {
            return StatusResponse {
                has_data: false,
                last_updated: None,
                status: "Waiting for data...".to_string(),
                healthy,
                stats: None,
            }
        }
    };

    StatusResponse {
        has_data: true,
        last_updated: snapshot
            .last_update
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        status: snapshot
            .error
            .clone()
            .unwrap_or_else(|| "Active".to_string()),
        healthy,
        stats: Some(processor::statistics(dataset)),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{Dataset, Reading};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn snapshot_with_data(error: Option<&str>) -> Snapshot {
        // ---
        let noon = NaiveDate::from_ymd_opt(2024, 8, 21)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Snapshot {
            dataset: Some(Arc::new(Dataset {
                readings: vec![Reading {
                    timestamp: noon,
                    flow: 1.0,
                    tds: 100.0,
                    ph: 7.2,
                    depth: 3.0,
                }],
                dropped_rows: 0,
            })),
            last_update: Some(noon),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_waiting_without_data() {
        // ---
        let status = build_status(&Snapshot::default());
        assert!(!status.has_data);
        assert_eq!(status.status, "Waiting for data...");
        assert!(status.stats.is_none());
    }

    #[test]
    fn test_active_with_data() {
        // ---
        let status = build_status(&snapshot_with_data(None));
        assert!(status.has_data && status.healthy);
        assert_eq!(status.status, "Active");
        assert_eq!(status.last_updated.as_deref(), Some("2024-08-21 12:00:00"));
        assert_eq!(status.stats.unwrap().avg_ph, 7.2);
    }

    #[test]
    fn test_error_text_replaces_active() {
        // ---
        let status = build_status(&snapshot_with_data(Some("Failed to fetch new data")));
        assert!(!status.healthy);
        assert_eq!(status.status, "Failed to fetch new data");
    }
}
