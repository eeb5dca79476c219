//! Data models for the water quality pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Raw sensor row as delivered by the API.
///
/// Field names are the upstream contract. Values stay loosely typed here;
/// the processor decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, rename = "FlowInd")]
    pub flow: Option<Value>,
    #[serde(default, rename = "TDS")]
    pub tds: Option<Value>,
    #[serde(default, rename = "pH")]
    pub ph: Option<Value>,
    #[serde(default, rename = "Depth")]
    pub depth: Option<Value>,
}

/// Cleaned reading served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub timestamp: NaiveDateTime,
    pub flow: f64,
    pub tds: f64,
    pub ph: f64,
    pub depth: f64,
}

/// Cleaned, chronologically sorted batch of readings.
///
/// Built once per refresh cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    // ---
    pub readings: Vec<Reading>,
    /// Input rows discarded because their timestamp could not be parsed.
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings at or after `start`. Relies on the ascending sort.
    pub fn since(&self, start: NaiveDateTime) -> &[Reading] {
        // ---
        let first = self.readings.partition_point(|r| r.timestamp < start);
        &self.readings[first..]
    }
}

/// Summary statistics over a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    // ---
    pub records: usize,
    pub latest_reading: Option<NaiveDateTime>,
    pub avg_ph: f64,
    pub avg_tds: f64,
    pub avg_flow: f64,
    pub avg_depth: f64,
    pub dropped_rows: usize,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 21)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(hour: u32) -> Reading {
        Reading {
            timestamp: at(hour),
            flow: 1.0,
            tds: 100.0,
            ph: 7.0,
            depth: 2.0,
        }
    }

    #[test]
    fn test_raw_reading_uses_upstream_names() {
        // ---
        let raw: RawReading = serde_json::from_str(
            r#"{"timestamp": "21-Aug-2024 12:11:13", "FlowInd": "3.4", "TDS": 120, "pH": null}"#,
        )
        .unwrap();

        assert_eq!(raw.timestamp, Some(Value::from("21-Aug-2024 12:11:13")));
        assert_eq!(raw.flow, Some(Value::from("3.4")));
        assert_eq!(raw.tds, Some(Value::from(120)));
        assert_eq!(raw.ph, None);
        assert_eq!(raw.depth, None);
    }

    #[test]
    fn test_since_slices_sorted_readings() {
        // ---
        let dataset = Dataset {
            readings: vec![reading(1), reading(2), reading(3)],
            dropped_rows: 0,
        };

        assert_eq!(dataset.since(at(2)).len(), 2);
        assert_eq!(dataset.since(at(0)).len(), 3);
        assert!(dataset.since(at(4)).is_empty());
    }
}
