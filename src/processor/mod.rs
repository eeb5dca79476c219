//! Cleaning, aggregation and statistics for sensor batches.
//!
//! Gateway for the processor stages (EMBP): callers only see the functions
//! re-exported here. Every public entry point is total. Failures come back
//! as `None` (or a default [`Statistics`](crate::Statistics)) and are logged
//! where they happen; [`try_preprocess`] exposes the typed reason for callers
//! that want it.

use thiserror::Error;

mod aggregate;
mod preprocess;
mod stats;
mod timestamp;

pub use aggregate::{aggregate, Period, PeriodParseError};
pub use preprocess::{preprocess, try_preprocess};
pub use stats::statistics;
pub use timestamp::{parse_timestamp, parse_timestamp_str};

// ---

/// Neutral pH, used when no valid pH exists or a value is out of range.
pub const DEFAULT_PH: f64 = 7.0;

/// Default for tds, depth and flow.
pub const DEFAULT_MEASUREMENT: f64 = 0.0;

pub const PH_MIN: f64 = 0.0;
pub const PH_MAX: f64 = 14.0;

/// Reasons a batch yields no dataset.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("batch is empty")]
    EmptyBatch,

    #[error("all {dropped} rows had unparseable timestamps")]
    NoValidTimestamps { dropped: usize },

    #[error("timestamp arithmetic out of range while {stage}")]
    TimeOutOfRange { stage: &'static str },
}

/// Round to `decimals` places, ties to even.
///
/// Idempotent: rounding an already rounded value returns it unchanged.
/// Magnitudes too large to scale carry no fractional digits and pass through.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    // ---
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

/// Fold `value` into a running mean that already covers `count - 1` values.
///
/// Stays finite for finite inputs, unlike a sum divided at the end.
pub(crate) fn update_mean(mean: f64, count: usize, value: f64) -> f64 {
    mean + (value - mean) / count as f64
}

/// Arithmetic mean, `None` for an empty input.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    // ---
    let (mean, count) = values.fold((0.0, 0usize), |(mean, count), v| {
        (update_mean(mean, count + 1, v), count + 1)
    });
    (count > 0).then_some(mean)
}
