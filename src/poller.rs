//! Background refresh loop: fetch, clean, publish, sleep.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::fetcher::ReadingSource;
use crate::{processor, SharedState};

// ---

/// What a single refresh cycle did to the shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { records: usize, dropped_rows: usize },
    NoData,
    FetchFailed,
}

/// Run one fetch → preprocess → publish cycle.
///
/// Errors never escape: they are logged and recorded on the shared state,
/// which keeps showing the previous dataset.
pub async fn run_cycle<S: ReadingSource>(source: &mut S, state: &SharedState) -> CycleOutcome {
    // ---
    let raw = match source.fetch().await {
        Ok(raw) => raw,
        Err(e) => {
            let message = format!("Failed to fetch new data: {}", e);
            error!("{}", message);
            state.record_error(message).await;
            return CycleOutcome::FetchFailed;
        }
    };

    match processor::preprocess(&raw) {
        Some(dataset) => {
            let outcome = CycleOutcome::Published {
                records: dataset.len(),
                dropped_rows: dataset.dropped_rows,
            };
            state.publish(dataset).await;
            info!("Data updated successfully");
            outcome
        }
        None => {
            warn!("Fetched {} rows but none were usable", raw.len());
            state
                .record_error("Preprocessing produced no usable readings")
                .await;
            CycleOutcome::NoData
        }
    }
}

/// Refresh forever on a fixed cadence. Spawn once.
pub async fn run<S>(mut source: S, state: SharedState, interval: Duration)
where
    S: ReadingSource + Send,
{
    // ---
    info!("Poller started, refreshing every {:?}", interval);
    loop {
        let outcome = run_cycle(&mut source, &state).await;
        tracing::debug!("Refresh cycle finished: {:?}", outcome);
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::fetcher::FetchError;
    use crate::RawReading;
    use serde_json::json;
    use std::collections::VecDeque;

    struct ScriptedSource {
        responses: VecDeque<Result<Vec<RawReading>, FetchError>>,
    }

    impl ReadingSource for ScriptedSource {
        async fn fetch(&mut self) -> Result<Vec<RawReading>, FetchError> {
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Payload("script exhausted".into())))
        }
    }

    fn row(ts: &str, ph: f64) -> RawReading {
        RawReading {
            timestamp: Some(json!(ts)),
            ph: Some(json!(ph)),
            ..RawReading::default()
        }
    }

    #[tokio::test]
    async fn test_cycles_publish_and_flag_errors() {
        // ---
        let mut source = ScriptedSource {
            responses: VecDeque::from(vec![
                Ok(vec![row("2024-08-21 10:00:00", 7.2), row("bogus", 7.0)]),
                Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)),
                Ok(vec![row("bogus", 7.0)]),
            ]),
        };
        let state = SharedState::new();

        let outcome = run_cycle(&mut source, &state).await;
        assert_eq!(
            outcome,
            CycleOutcome::Published {
                records: 1,
                dropped_rows: 1
            }
        );
        let snap = state.snapshot().await;
        assert!(snap.error.is_none());
        assert!(snap.last_update.is_some());

        assert_eq!(run_cycle(&mut source, &state).await, CycleOutcome::FetchFailed);
        let snap = state.snapshot().await;
        assert!(snap.error.unwrap().starts_with("Failed to fetch new data"));
        assert_eq!(snap.dataset.unwrap().len(), 1, "previous dataset kept");

        assert_eq!(run_cycle(&mut source, &state).await, CycleOutcome::NoData);
        let snap = state.snapshot().await;
        assert_eq!(
            snap.error.as_deref(),
            Some("Preprocessing produced no usable readings")
        );
    }
}
