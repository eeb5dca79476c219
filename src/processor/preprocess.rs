//! Batch cleaning: raw API rows in, sorted display-ready dataset out.

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::timestamp::parse_timestamp;
use super::{round_to, ProcessError, DEFAULT_MEASUREMENT, DEFAULT_PH, PH_MAX, PH_MIN};
use crate::{Dataset, RawReading, Reading};

// ---

/// One measurement column while it is being cleaned.
struct Column {
    name: &'static str,
    values: Vec<Option<f64>>,
    default: f64,
    decimals: u32,
}

impl Column {
    fn new(name: &'static str, values: Vec<Option<f64>>, default: f64, decimals: u32) -> Self {
        Self {
            name,
            values,
            default,
            decimals,
        }
    }

    /// Forward fill, then backward fill, then the column default.
    fn fill(&mut self) -> Vec<f64> {
        // ---
        let mut last = None;
        for slot in self.values.iter_mut() {
            if let Some(v) = *slot {
                last = Some(v);
            } else {
                *slot = last;
            }
        }

        // Leading gaps take the first valid value.
        let first = self.values.iter().flatten().next().copied();
        if first.is_none() {
            debug!("Column {} has no valid values, using default {}", self.name, self.default);
        }
        self.values
            .iter()
            .map(|v| v.or(first).unwrap_or(self.default))
            .collect()
    }
}

/// Clean a raw batch.
///
/// Returns `None` when the batch is empty or no row has a usable timestamp;
/// the reason is logged. See [`try_preprocess`] for the typed error.
pub fn preprocess(raw: &[RawReading]) -> Option<Dataset> {
    // ---
    match try_preprocess(raw) {
        Ok(dataset) => Some(dataset),
        Err(ProcessError::EmptyBatch) => {
            warn!("Empty batch received for preprocessing");
            None
        }
        Err(e) => {
            warn!("Preprocessing produced no dataset: {}", e);
            None
        }
    }
}

/// Clean a raw batch, reporting why nothing came out.
///
/// Steps, in order: parse timestamps and drop unparseable rows, coerce the
/// four measurements to numbers, fill gaps, clip out-of-range values to
/// their defaults, round for display, sort by timestamp.
pub fn try_preprocess(raw: &[RawReading]) -> Result<Dataset, ProcessError> {
    // ---
    if raw.is_empty() {
        return Err(ProcessError::EmptyBatch);
    }

    info!("Starting preprocessing of {} records", raw.len());

    // Step 1: timestamps
    let mut rows: Vec<(NaiveDateTime, &RawReading)> = Vec::with_capacity(raw.len());
    for row in raw {
        match row.timestamp.as_ref().and_then(parse_timestamp) {
            Some(ts) => rows.push((ts, row)),
            None => debug!("Could not parse timestamp: {:?}", row.timestamp),
        }
    }

    let dropped_rows = raw.len() - rows.len();
    if dropped_rows > 0 {
        warn!("Removing {} rows with invalid timestamps", dropped_rows);
    }
    if rows.is_empty() {
        return Err(ProcessError::NoValidTimestamps {
            dropped: dropped_rows,
        });
    }

    // Step 2: numeric coercion
    let column = |name, pick: fn(&RawReading) -> Option<&Value>, default, decimals| {
        let values = rows.iter().map(|(_, r)| pick(r).and_then(to_number)).collect();
        Column::new(name, values, default, decimals)
    };
    let mut flow = column("flow", |r| r.flow.as_ref(), DEFAULT_MEASUREMENT, 2);
    let mut tds = column("tds", |r| r.tds.as_ref(), DEFAULT_MEASUREMENT, 0);
    let mut ph = column("ph", |r| r.ph.as_ref(), DEFAULT_PH, 2);
    let mut depth = column("depth", |r| r.depth.as_ref(), DEFAULT_MEASUREMENT, 2);

    // Steps 3-5: fill, clip, round
    let flow_values = finish(&mut flow, clip_negative);
    let tds_values = finish(&mut tds, clip_negative);
    let ph_values = finish(&mut ph, clip_ph);
    let depth_values = finish(&mut depth, clip_negative);

    let mut readings: Vec<Reading> = rows
        .iter()
        .enumerate()
        .map(|(i, (timestamp, _))| Reading {
            timestamp: *timestamp,
            flow: flow_values[i],
            tds: tds_values[i],
            ph: ph_values[i],
            depth: depth_values[i],
        })
        .collect();

    // Step 6: stable sort keeps arrival order among equal timestamps
    readings.sort_by_key(|r| r.timestamp);

    log_quality(&readings);

    Ok(Dataset {
        readings,
        dropped_rows,
    })
}

fn finish(column: &mut Column, clip: fn(f64) -> f64) -> Vec<f64> {
    // ---
    let decimals = column.decimals;
    column
        .fill()
        .into_iter()
        .map(|v| round_to(clip(v), decimals))
        .collect()
}

/// Coerce a loosely typed JSON value to a finite number.
fn to_number(value: &Value) -> Option<f64> {
    // ---
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn clip_ph(ph: f64) -> f64 {
    if (PH_MIN..=PH_MAX).contains(&ph) {
        ph
    } else {
        DEFAULT_PH
    }
}

fn clip_negative(v: f64) -> f64 {
    if v < 0.0 {
        DEFAULT_MEASUREMENT
    } else {
        v
    }
}

fn log_quality(readings: &[Reading]) {
    // ---
    let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
        return;
    };
    info!("Processed {} readings", readings.len());
    info!("Timestamp range: {} to {}", first.timestamp, last.timestamp);

    let fields: [(&str, fn(&Reading) -> f64); 4] = [
        ("flow", |r| r.flow),
        ("tds", |r| r.tds),
        ("ph", |r| r.ph),
        ("depth", |r| r.depth),
    ];
    for (name, get) in fields {
        let min = readings.iter().map(get).fold(f64::INFINITY, f64::min);
        let max = readings.iter().map(get).fold(f64::NEG_INFINITY, f64::max);
        debug!("{}: {:.2} to {:.2}", name, min, max);
    }
}
