//! Relational metrics connector backed by a PostgreSQL connection pool.
//!
//! The pool replaces the one-shared-handle pattern: each query checks a
//! connection out for exclusive use and returns it, so concurrent gateway
//! requests never share a handle. Connections are established lazily on
//! first checkout and re-established by the pool when they drop.
//!
//! All read paths assume a fixed `metrics` table with columns
//! `metric_name`, `metric_value` and `timestamp`; no schema validation is
//! performed. Time-bounded queries always use bound parameters.

use crate::error::ConnectorResult;
use crate::source::DbSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mosaiq_core::{AggregatedMetric, MetricPoint, MetricSample, TimeRange};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Connection settings for the metrics database.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "metrics_db".to_string(),
            user: String::new(),
            password: String::new(),
            max_connections: 5,
        }
    }
}

impl PostgresConfig {
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Metrics reader over the pooled database connection.
#[derive(Debug, Clone)]
pub struct PostgresMetrics {
    pool: PgPool,
}

impl PostgresMetrics {
    /// Build the connector with a lazy pool; no connection is attempted
    /// until the first query runs.
    pub fn new(config: &PostgresConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(config.connect_options());
        Self { pool }
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DbSource for PostgresMetrics {
    async fn fetch_recent(&self) -> ConnectorResult<Vec<MetricSample>> {
        let rows = sqlx::query(
            "SELECT metric_name, metric_value, timestamp \
             FROM metrics \
             WHERE timestamp >= NOW() - INTERVAL '1 hour' \
             ORDER BY timestamp DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut samples = Vec::with_capacity(rows.len());
        for row in rows {
            samples.push(MetricSample {
                name: row.try_get("metric_name")?,
                value: row.try_get("metric_value")?,
                timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
            });
        }
        Ok(samples)
    }

    async fn fetch_aggregated(&self) -> ConnectorResult<HashMap<String, AggregatedMetric>> {
        let rows = sqlx::query(
            "SELECT metric_name, \
                    AVG(metric_value) AS avg_value, \
                    MAX(metric_value) AS max_value, \
                    MIN(metric_value) AS min_value, \
                    COUNT(*) AS count \
             FROM metrics \
             WHERE timestamp >= NOW() - INTERVAL '24 hours' \
             GROUP BY metric_name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut aggregates = HashMap::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("metric_name")?;
            aggregates.insert(
                name,
                AggregatedMetric {
                    avg: row.try_get("avg_value")?,
                    max: row.try_get("max_value")?,
                    min: row.try_get("min_value")?,
                    count: row.try_get("count")?,
                },
            );
        }
        Ok(aggregates)
    }

    async fn fetch_time_series(
        &self,
        metric: &str,
        range: &TimeRange,
    ) -> ConnectorResult<Vec<MetricPoint>> {
        let rows = sqlx::query(
            "SELECT timestamp, metric_value \
             FROM metrics \
             WHERE metric_name = $1 AND timestamp >= $2 AND timestamp <= $3 \
             ORDER BY timestamp ASC",
        )
        .bind(metric)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
            points.push(MetricPoint {
                timestamp: timestamp.timestamp_millis(),
                value: row.try_get("metric_value")?,
            });
        }
        Ok(points)
    }

    async fn ping(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "postgres ping failed");
                false
            }
        }
    }
}
