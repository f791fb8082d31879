use crate::config::AppState;
use axum::{extract::State, Json};
use mosaiq_core::{
    jitter, ApiKind, Datapoint, Family, Target, TimeRange, TimeSeries, QUERY_STEP_MILLIS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Index pattern search-engine time series are read from.
const ELASTIC_INDEX: &str = "metrics-*";

/// Metric names advertised to the dashboarding tool. Order is part of the
/// contract: `/search` must return the identical list on every call.
const KNOWN_METRICS: &[&str] = &[
    // API metrics
    "api.weather.temperature",
    "api.weather.wind_speed",
    "api.weather.humidity",
    "api.crypto.bitcoin",
    "api.crypto.ethereum",
    "api.github.stars",
    "api.github.forks",
    "api.github.open_issues",
    // PostgreSQL metrics
    "postgres.cpu_usage",
    "postgres.memory_usage",
    "postgres.disk_io",
    "postgres.connections",
    // Elasticsearch metrics
    "elastic.total_logs",
    "elastic.error_count",
    "elastic.avg_response_time",
    "elastic.request_count",
];

/// Health check. Probes each source and reports booleans; a dead source is
/// a degraded datasource, never a 5xx.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Multi-source metrics gateway is running".to_string(),
        datasources: DatasourceStatus {
            postgresql: state.db.ping().await,
            elasticsearch: state.logs.is_connected(),
            apis: true,
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub datasources: DatasourceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasourceStatus {
    pub postgresql: bool,
    pub elasticsearch: bool,
    pub apis: bool,
}

/// Return the available metric names.
pub async fn search() -> Json<Vec<&'static str>> {
    Json(KNOWN_METRICS.to_vec())
}

/// Annotations feature stub; the protocol requires the endpoint.
pub async fn annotations() -> Json<Vec<serde_json::Value>> {
    Json(Vec::new())
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub range: TimeRange,
    pub targets: Vec<QueryTarget>,
}

#[derive(Debug, Deserialize)]
pub struct QueryTarget {
    pub target: String,
}

/// Time-series query. One response entry per requested target, in request
/// order, echoing the target string verbatim. A failed or unmatched source
/// degrades that entry to an empty datapoint list.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Json<Vec<TimeSeries>> {
    let timestamps = req.range.timestamps(QUERY_STEP_MILLIS);

    let mut results = Vec::with_capacity(req.targets.len());
    for requested in &req.targets {
        let target = Target::parse(&requested.target);
        let datapoints = datapoints_for(&state, &target, &req.range, &timestamps).await;
        results.push(TimeSeries {
            target: requested.target.clone(),
            datapoints,
        });
    }

    Json(results)
}

async fn datapoints_for(
    state: &AppState,
    target: &Target,
    range: &TimeRange,
    timestamps: &[i64],
) -> Vec<Datapoint> {
    let result = match target.family() {
        Family::Api(kind) => {
            let fetched = match kind {
                ApiKind::Weather => state.api.fetch_weather().await,
                ApiKind::Crypto => state.api.fetch_crypto().await,
                ApiKind::Github => state.api.fetch_github().await,
            };
            fetched.map(|metrics| synthesize(&metrics, target.leaf(), kind, timestamps))
        }
        Family::Postgres => state
            .db
            .fetch_time_series(target.leaf(), range)
            .await
            .map(|points| {
                points
                    .into_iter()
                    .map(|p| Datapoint(p.value, p.timestamp))
                    .collect()
            }),
        Family::Elastic => state
            .logs
            .fetch_time_series(ELASTIC_INDEX, target.leaf(), range)
            .await
            .map(|points| {
                points
                    .into_iter()
                    .map(|p| Datapoint(p.value, p.timestamp))
                    .collect()
            }),
        Family::Unknown => Ok(Vec::new()),
    };

    match result {
        Ok(datapoints) => datapoints,
        Err(err) => {
            tracing::warn!(metric = %target, error = %err, "source failed, returning empty series");
            Vec::new()
        }
    }
}

/// Replicate one fetched scalar across the timestamp grid with
/// per-timestamp jitter. A leaf the source did not report yields nothing.
fn synthesize(
    metrics: &HashMap<String, f64>,
    leaf: &str,
    kind: ApiKind,
    timestamps: &[i64],
) -> Vec<Datapoint> {
    let Some(&value) = metrics.get(leaf) else {
        return Vec::new();
    };

    let (modulus, scale) = kind.jitter_params();
    timestamps
        .iter()
        .map(|&ts| Datapoint(value + jitter(ts, modulus, scale), ts))
        .collect()
}
