//! Source traits the gateway is programmed against.
//!
//! Connector instances are injected into the gateway at construction time,
//! so tests can substitute fakes without touching the network.

use crate::error::ConnectorResult;
use async_trait::async_trait;
use mosaiq_core::{AggregatedMetric, MetricPoint, MetricSample, TimeRange};
use std::collections::HashMap;

/// External-API metric source: one outbound GET per call, flat name/value
/// mapping back.
#[async_trait]
pub trait ApiSource: Send + Sync {
    async fn fetch_weather(&self) -> ConnectorResult<HashMap<String, f64>>;
    async fn fetch_crypto(&self) -> ConnectorResult<HashMap<String, f64>>;
    async fn fetch_github(&self) -> ConnectorResult<HashMap<String, f64>>;
}

/// Relational metric store with a fixed `metrics` table.
#[async_trait]
pub trait DbSource: Send + Sync {
    /// Raw samples from the last hour, newest first.
    async fn fetch_recent(&self) -> ConnectorResult<Vec<MetricSample>>;

    /// Per-name aggregate statistics over the last 24 hours.
    async fn fetch_aggregated(&self) -> ConnectorResult<HashMap<String, AggregatedMetric>>;

    /// Time series for one metric within an inclusive range, ascending.
    async fn fetch_time_series(
        &self,
        metric: &str,
        range: &TimeRange,
    ) -> ConnectorResult<Vec<MetricPoint>>;

    /// Health probe; reports reachability, never errors.
    async fn ping(&self) -> bool;
}

/// Search-engine log/application metric source.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Log volume and per-level counts over the last hour, flattened.
    async fn fetch_log_metrics(
        &self,
        index: &str,
        time_field: &str,
    ) -> ConnectorResult<HashMap<String, f64>>;

    /// Date-histogram time series for one field within a range.
    async fn fetch_time_series(
        &self,
        index: &str,
        field: &str,
        range: &TimeRange,
    ) -> ConnectorResult<Vec<MetricPoint>>;

    /// Application performance aggregates over the last five minutes.
    async fn fetch_application_metrics(
        &self,
        index: &str,
    ) -> ConnectorResult<HashMap<String, f64>>;

    /// Liveness flag established at construction.
    fn is_connected(&self) -> bool;
}
