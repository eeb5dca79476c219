//! Time-bucketed means for chart downsampling.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::DateTime;
use thiserror::Error;
use tracing::error;

use super::{round_to, update_mean, ProcessError};
use crate::{Dataset, Reading};

// ---

/// Fixed-width resampling period.
///
/// Parsed from pandas-style aliases with an optional multiplier:
/// `S`/`s`, `T`/`min`, `H`/`h`, `D`/`d`, e.g. `H`, `15min`, `6H`, `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    seconds: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodParseError {
    #[error("empty period")]
    Empty,

    #[error("unknown period unit '{0}'")]
    UnknownUnit(String),

    #[error("period multiplier must be a positive integer, got '{0}'")]
    InvalidMultiplier(String),
}

impl Period {
    pub const HOURLY: Period = Period { seconds: 3600 };

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        (seconds > 0).then_some(Self { seconds })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::HOURLY
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seconds {
            s if s % 86_400 == 0 => write!(f, "{}D", s / 86_400),
            s if s % 3600 == 0 => write!(f, "{}H", s / 3600),
            s if s % 60 == 0 => write!(f, "{}min", s / 60),
            s => write!(f, "{}S", s),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        let s = s.trim();
        if s.is_empty() {
            return Err(PeriodParseError::Empty);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (count, unit) = s.split_at(split);

        let unit_seconds = match unit {
            "S" | "s" | "sec" => 1,
            "T" | "min" => 60,
            "H" | "h" => 3600,
            "D" | "d" => 86_400,
            other => return Err(PeriodParseError::UnknownUnit(other.to_string())),
        };

        let multiplier = if count.is_empty() {
            1
        } else {
            count
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| PeriodParseError::InvalidMultiplier(count.to_string()))?
        };

        multiplier
            .checked_mul(unit_seconds)
            .and_then(Period::from_seconds)
            .ok_or_else(|| PeriodParseError::InvalidMultiplier(count.to_string()))
    }
}

/// Running per-field means for one time window.
#[derive(Default)]
struct Bucket {
    count: usize,
    flow: f64,
    tds: f64,
    ph: f64,
    depth: f64,
}

impl Bucket {
    fn add(&mut self, r: &Reading) {
        self.count += 1;
        self.flow = update_mean(self.flow, self.count, r.flow);
        self.tds = update_mean(self.tds, self.count, r.tds);
        self.ph = update_mean(self.ph, self.count, r.ph);
        self.depth = update_mean(self.depth, self.count, r.depth);
    }
}

/// Resample a dataset into calendar-aligned buckets of `period`.
///
/// Buckets are anchored on the Unix epoch grid, so hourly buckets start on
/// the hour and daily ones at midnight. Each non-empty bucket yields one
/// reading stamped with the bucket start and carrying per-field means.
/// Empty input gives `None`.
pub fn aggregate(dataset: &Dataset, period: Period) -> Option<Dataset> {
    // ---
    match try_aggregate(dataset, period) {
        Ok(Some(aggregated)) => Some(aggregated),
        Ok(None) => None,
        Err(e) => {
            error!("Aggregation error: {}", e);
            None
        }
    }
}

fn try_aggregate(dataset: &Dataset, period: Period) -> Result<Option<Dataset>, ProcessError> {
    // ---
    if dataset.is_empty() {
        return Ok(None);
    }

    let width = period.seconds();
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for reading in &dataset.readings {
        let start = reading.timestamp.and_utc().timestamp().div_euclid(width) * width;
        buckets.entry(start).or_default().add(reading);
    }

    let readings = buckets
        .into_iter()
        .map(|(start, b)| {
            let timestamp = DateTime::from_timestamp(start, 0)
                .ok_or(ProcessError::TimeOutOfRange {
                    stage: "aligning buckets",
                })?
                .naive_utc();
            Ok(Reading {
                timestamp,
                flow: round_to(b.flow, 2),
                tds: round_to(b.tds, 2),
                ph: round_to(b.ph, 2),
                depth: round_to(b.depth, 2),
            })
        })
        .collect::<Result<Vec<_>, ProcessError>>()?;

    Ok(Some(Dataset {
        readings,
        dropped_rows: dataset.dropped_rows,
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 21)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn reading(hour: u32, minute: u32, ph: f64, tds: f64) -> Reading {
        Reading {
            timestamp: at(hour, minute),
            flow: 2.0,
            tds,
            ph,
            depth: 1.0,
        }
    }

    #[test]
    fn test_parse_periods() {
        // ---
        assert_eq!("H".parse::<Period>().unwrap().seconds(), 3600);
        assert_eq!("h".parse::<Period>().unwrap().seconds(), 3600);
        assert_eq!("6H".parse::<Period>().unwrap().seconds(), 6 * 3600);
        assert_eq!("15min".parse::<Period>().unwrap().seconds(), 900);
        assert_eq!("30T".parse::<Period>().unwrap().seconds(), 1800);
        assert_eq!("1D".parse::<Period>().unwrap().seconds(), 86_400);
        assert_eq!("10s".parse::<Period>().unwrap().seconds(), 10);
    }

    #[test]
    fn test_parse_invalid_periods() {
        // ---
        assert_eq!("".parse::<Period>(), Err(PeriodParseError::Empty));
        assert_eq!(
            "5fortnights".parse::<Period>(),
            Err(PeriodParseError::UnknownUnit("fortnights".into()))
        );
        assert_eq!(
            "0H".parse::<Period>(),
            Err(PeriodParseError::InvalidMultiplier("0".into()))
        );
    }

    #[test]
    fn test_period_display() {
        // ---
        assert_eq!(Period::HOURLY.to_string(), "1H");
        assert_eq!("15min".parse::<Period>().unwrap().to_string(), "15min");
        assert_eq!("2D".parse::<Period>().unwrap().to_string(), "2D");
    }

    #[test]
    fn test_hourly_buckets() {
        // ---
        let dataset = Dataset {
            readings: vec![
                reading(10, 5, 6.0, 100.0),
                reading(10, 55, 8.0, 101.0),
                reading(12, 30, 7.5, 90.0),
            ],
            dropped_rows: 3,
        };

        let agg = aggregate(&dataset, Period::HOURLY).unwrap();
        assert_eq!(agg.len(), 2, "empty 11:00 bucket is not emitted");
        assert_eq!(agg.readings[0].timestamp, at(10, 0));
        assert_eq!(agg.readings[0].ph, 7.0);
        assert_eq!(agg.readings[0].tds, 100.5);
        assert_eq!(agg.readings[1].timestamp, at(12, 0));
        assert_eq!(agg.readings[1].ph, 7.5);
        assert_eq!(agg.dropped_rows, 3);
    }

    #[test]
    fn test_buckets_align_to_grid() {
        // ---
        let dataset = Dataset {
            readings: vec![reading(10, 7, 7.0, 1.0), reading(10, 22, 7.0, 1.0)],
            dropped_rows: 0,
        };

        let agg = aggregate(&dataset, "15min".parse().unwrap()).unwrap();
        let starts: Vec<NaiveDateTime> = agg.readings.iter().map(|r| r.timestamp).collect();
        assert_eq!(starts, vec![at(10, 0), at(10, 15)]);

        let daily = aggregate(&dataset, "D".parse().unwrap()).unwrap();
        assert_eq!(daily.readings[0].timestamp, at(0, 0));
    }

    #[test]
    fn test_bucket_means_stay_finite_for_huge_values() {
        // ---
        let dataset = Dataset {
            readings: vec![reading(10, 5, 7.0, f64::MAX), reading(10, 35, 7.0, f64::MAX)],
            dropped_rows: 0,
        };

        let agg = aggregate(&dataset, Period::HOURLY).unwrap();
        assert_eq!(agg.readings[0].tds, f64::MAX);
    }

    #[test]
    fn test_aggregate_empty_is_no_result() {
        // ---
        assert_eq!(aggregate(&Dataset::default(), Period::HOURLY), None);
    }
}
