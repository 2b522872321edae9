use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TELEMETRY_HOURS: u32 = 24;
pub const DEFAULT_TELEMETRY_POINTS: u32 = 100;
pub const MAX_TELEMETRY_POINTS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryWindow {
    pub hours: u32,
    pub points: u32,
}

impl Default for TelemetryWindow {
    fn default() -> Self {
        Self {
            hours: DEFAULT_TELEMETRY_HOURS,
            points: DEFAULT_TELEMETRY_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySeries {
    // Unix seconds, oldest first.
    pub timestamps: Vec<i64>,
    pub temperature: Vec<f64>,
    pub pressure: Vec<f64>,
    pub flow_rate: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySampleSet {
    pub well_id: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub units: BTreeMap<String, String>,
    pub telemetry: TelemetrySeries,
    pub period_hours: u32,
    pub points: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("{series} has {actual} samples but there are {expected} timestamps")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("timestamps are not strictly increasing at index {index}")]
    NonIncreasingTimestamps { index: usize },
}

impl TelemetrySampleSet {
    pub fn len(&self) -> usize {
        self.telemetry.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.telemetry.timestamps.is_empty()
    }

    pub fn validate(&self) -> Result<(), TelemetryError> {
        let expected = self.telemetry.timestamps.len();
        let series = [
            ("temperature", self.telemetry.temperature.len()),
            ("pressure", self.telemetry.pressure.len()),
            ("flow_rate", self.telemetry.flow_rate.len()),
        ];

        for (series, actual) in series {
            if actual != expected {
                return Err(TelemetryError::LengthMismatch {
                    series,
                    expected,
                    actual,
                });
            }
        }

        if let Some(index) = self
            .telemetry
            .timestamps
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(TelemetryError::NonIncreasingTimestamps { index: index + 1 });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{TelemetryError, TelemetrySampleSet, TelemetrySeries, TelemetryWindow};

    fn sample_set(timestamps: Vec<i64>, temperature: Vec<f64>) -> TelemetrySampleSet {
        let len = timestamps.len();
        TelemetrySampleSet {
            well_id: "WELL-001".to_string(),
            parameters: vec!["temperature".to_string()],
            units: BTreeMap::new(),
            telemetry: TelemetrySeries {
                timestamps,
                temperature,
                pressure: vec![40.0; len],
                flow_rate: vec![120.0; len],
            },
            period_hours: 1,
            points: len as u32,
        }
    }

    #[test]
    fn default_window_is_one_day_with_hundred_points() {
        let window = TelemetryWindow::default();
        assert_eq!(window.hours, 24);
        assert_eq!(window.points, 100);
    }

    #[test]
    fn accepts_aligned_increasing_series() {
        let set = sample_set(vec![10, 20, 30], vec![80.0, 81.0, 82.0]);
        assert_eq!(set.validate(), Ok(()));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rejects_length_mismatch() {
        let set = sample_set(vec![10, 20, 30], vec![80.0, 81.0]);
        assert_eq!(
            set.validate(),
            Err(TelemetryError::LengthMismatch {
                series: "temperature",
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn rejects_repeated_timestamp() {
        let set = sample_set(vec![10, 20, 20], vec![80.0, 81.0, 82.0]);
        assert_eq!(
            set.validate(),
            Err(TelemetryError::NonIncreasingTimestamps { index: 2 })
        );
    }

    #[test]
    fn empty_series_is_valid() {
        let set = sample_set(Vec::new(), Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.validate(), Ok(()));
    }
}
