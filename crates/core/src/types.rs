use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single `[value, timestamp_millis]` pair in a time-series response.
///
/// Serializes as a two-element JSON array, which is what the dashboarding
/// protocol expects for datapoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint(pub f64, pub i64);

impl Datapoint {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.1
    }
}

/// One requested metric's time series in a query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    pub target: String,
    pub datapoints: Vec<Datapoint>,
}

impl TimeSeries {
    /// An entry with no data for the given target. Used for unmatched
    /// prefixes and degraded sources; the protocol wants `[]`, never null.
    pub fn empty(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            datapoints: Vec::new(),
        }
    }
}

/// A raw metric observation as stored by an upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A single point of an upstream time series, already in epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// Aggregate statistics for one metric name over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: i64,
}

/// Inclusive query time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Generate the epoch-millis timestamp sequence from `from` to `to`
    /// inclusive at `step_millis` intervals. A reversed range (`from > to`)
    /// yields an empty sequence rather than an error; see DESIGN.md.
    pub fn timestamps(&self, step_millis: i64) -> Vec<i64> {
        let step = Duration::milliseconds(step_millis);
        let mut out = Vec::new();
        let mut current = self.from;
        while current <= self.to {
            out.push(current.timestamp_millis());
            current += step;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::QUERY_STEP_MILLIS;
    use chrono::TimeZone;

    #[test]
    fn datapoint_serializes_as_array() {
        let dp = Datapoint(42.5, 1704067200000);
        let json = serde_json::to_value(dp).unwrap();
        assert_eq!(json, serde_json::json!([42.5, 1704067200000i64]));
    }

    #[test]
    fn empty_series_has_empty_array() {
        let series = TimeSeries::empty("unknown.thing");
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["target"], "unknown.thing");
        assert_eq!(json["datapoints"], serde_json::json!([]));
    }

    #[test]
    fn timestamps_inclusive_bounds() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap(),
        );
        let ts = range.timestamps(QUERY_STEP_MILLIS);
        // Minutes 0, 5 and 10.
        assert_eq!(ts.len(), 3);
        assert_eq!(ts[0], range.from.timestamp_millis());
        assert_eq!(ts[2], range.to.timestamp_millis());
    }

    #[test]
    fn timestamps_strictly_increasing() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        );
        let ts = range.timestamps(QUERY_STEP_MILLIS);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reversed_range_yields_empty_sequence() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(range.timestamps(QUERY_STEP_MILLIS).is_empty());
    }

    #[test]
    fn single_instant_range_yields_one_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let range = TimeRange::new(at, at);
        assert_eq!(range.timestamps(QUERY_STEP_MILLIS).len(), 1);
    }
}
