//! Shared dashboard state.
//!
//! One mutex guards the current dataset, the time it was published and the
//! last error. The poller is the only writer; handlers take a copy via
//! [`SharedState::snapshot`] and release the lock straight away.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::Mutex;

use crate::Dataset;

// ---

/// Point-in-time copy of the shared state.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    // ---
    pub dataset: Option<Arc<Dataset>>,
    pub last_update: Option<NaiveDateTime>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<Snapshot>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current dataset wholesale and clear any error.
    pub async fn publish(&self, dataset: Dataset) {
        self.publish_at(dataset, Local::now().naive_local()).await
    }

    pub async fn publish_at(&self, dataset: Dataset, at: NaiveDateTime) {
        // ---
        let dataset = Arc::new(dataset);
        let mut guard = self.inner.lock().await;
        guard.dataset = Some(dataset);
        guard.last_update = Some(at);
        guard.error = None;
    }

    /// Flag a failed refresh. The previous dataset stays visible.
    pub async fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.inner.lock().await.error = Some(message);
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 21)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_starts_empty() {
        // ---
        let snap = SharedState::new().snapshot().await;
        assert!(snap.dataset.is_none());
        assert!(snap.last_update.is_none());
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_error_keeps_dataset_and_publish_clears_error() {
        // ---
        let state = SharedState::new();
        state.publish_at(Dataset::default(), noon()).await;
        state.record_error("Failed to fetch new data").await;

        let snap = state.snapshot().await;
        assert!(snap.dataset.is_some());
        assert_eq!(snap.last_update, Some(noon()));
        assert_eq!(snap.error.as_deref(), Some("Failed to fetch new data"));

        state.publish_at(Dataset::default(), noon()).await;
        assert!(state.snapshot().await.error.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_publishes() {
        // ---
        let state = SharedState::new();
        state.publish_at(Dataset::default(), noon()).await;
        let before = state.snapshot().await;

        let replacement = Dataset {
            readings: Vec::new(),
            dropped_rows: 4,
        };
        state.publish_at(replacement, noon()).await;

        assert_eq!(before.dataset.unwrap().dropped_rows, 0);
        assert_eq!(state.snapshot().await.dataset.unwrap().dropped_rows, 4);
    }
}
