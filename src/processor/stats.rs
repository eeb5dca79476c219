use super::{mean, round_to};
use crate::{Dataset, Reading, Statistics};

// ---

/// Summary statistics for the status line.
///
/// An empty dataset gives the default record: zero count, no latest
/// reading, all averages zero.
pub fn statistics(dataset: &Dataset) -> Statistics {
    // ---
    let readings = &dataset.readings;
    if readings.is_empty() {
        return Statistics {
            dropped_rows: dataset.dropped_rows,
            ..Statistics::default()
        };
    }

    let avg = |get: fn(&Reading) -> f64| round_to(mean(readings.iter().map(get)).unwrap_or(0.0), 2);

    Statistics {
        records: readings.len(),
        latest_reading: readings.iter().map(|r| r.timestamp).max(),
        avg_ph: avg(|r| r.ph),
        avg_tds: avg(|r| r.tds),
        avg_flow: avg(|r| r.flow),
        avg_depth: avg(|r| r.depth),
        dropped_rows: dataset.dropped_rows,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 21)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(hour: u32, ph: f64, tds: f64) -> Reading {
        Reading {
            timestamp: at(hour),
            flow: 1.5,
            tds,
            ph,
            depth: 0.25,
        }
    }

    #[test]
    fn test_statistics_means() {
        // ---
        let dataset = Dataset {
            readings: vec![
                reading(1, 6.0, 100.0),
                reading(2, 7.0, 101.0),
                reading(3, 8.0, 101.0),
            ],
            dropped_rows: 1,
        };

        let stats = statistics(&dataset);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.latest_reading, Some(at(3)));
        assert_eq!(stats.avg_ph, 7.0);
        assert_eq!(stats.avg_tds, 100.67);
        assert_eq!(stats.avg_flow, 1.5);
        assert_eq!(stats.avg_depth, 0.25);
        assert_eq!(stats.dropped_rows, 1);
    }

    #[test]
    fn test_statistics_empty_dataset() {
        // ---
        let stats = statistics(&Dataset::default());
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.records, 0);
        assert_eq!(stats.latest_reading, None);
        assert_eq!((stats.avg_ph, stats.avg_tds, stats.avg_flow, stats.avg_depth), (0.0, 0.0, 0.0, 0.0));
    }
}
