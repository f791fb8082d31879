//! Search-engine connector: log and application metrics out of
//! Elasticsearch aggregations, spoken over its REST API.
//!
//! A liveness probe runs once at construction. If the engine is
//! unreachable the connector stays disconnected for the process lifetime
//! and every call returns [`ConnectorError::Disconnected`] without a
//! network attempt.

use crate::error::{ConnectorError, ConnectorResult};
use crate::source::LogSource;
use async_trait::async_trait;
use mosaiq_core::{MetricPoint, TimeRange};
use serde_json::{json, Value};
use std::collections::HashMap;
use url::Url;

/// Connection settings for the search engine.
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Log/application metrics reader over the search engine's `_search` API.
#[derive(Debug, Clone)]
pub struct ElasticMetrics {
    http: reqwest::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
    connected: bool,
}

impl ElasticMetrics {
    /// Build the connector and probe the engine once. An unreachable
    /// engine does not error; it yields a permanently disconnected
    /// connector whose calls all short-circuit.
    pub async fn connect(config: &ElasticConfig) -> ConnectorResult<Self> {
        let base = Url::parse(&config.url).map_err(|e| ConnectorError::Config(e.to_string()))?;
        let http = reqwest::Client::new();

        let mut connector = Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            connected: false,
        };
        connector.connected = connector.ping().await;
        if !connector.connected {
            tracing::warn!(url = %connector.base, "search engine unreachable, connector disabled");
        }
        Ok(connector)
    }

    async fn ping(&self) -> bool {
        let request = self.authed(self.http.get(self.base.clone()));
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "search engine ping failed");
                false
            }
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    /// Run one `_search` against an index pattern and return the raw body.
    async fn search(&self, index: &str, body: Value) -> ConnectorResult<Value> {
        if !self.connected {
            return Err(ConnectorError::Disconnected);
        }

        let url = self
            .base
            .join(&format!("{index}/_search"))
            .map_err(|e| ConnectorError::Config(e.to_string()))?;

        let response = self
            .authed(self.http.post(url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl LogSource for ElasticMetrics {
    async fn fetch_log_metrics(
        &self,
        index: &str,
        time_field: &str,
    ) -> ConnectorResult<HashMap<String, f64>> {
        let body = json!({
            "size": 0,
            "query": { "range": { time_field: { "gte": "now-1h" } } },
            "aggs": {
                "log_levels": {
                    "terms": { "field": "level.keyword", "size": 10 }
                },
                "error_count": {
                    "filter": { "term": { "level.keyword": "ERROR" } }
                }
            }
        });

        let result = self.search(index, body).await?;

        let mut metrics = HashMap::new();
        metrics.insert("total_logs".to_string(), number_at(&result, "/hits/total/value")?);
        metrics.insert(
            "error_count".to_string(),
            number_at(&result, "/aggregations/error_count/doc_count")?,
        );

        for bucket in buckets_at(&result, "/aggregations/log_levels/buckets")? {
            let name = format!("logs_{}", bucket_key(bucket).to_lowercase());
            metrics.insert(name, doc_count(bucket));
        }
        Ok(metrics)
    }

    async fn fetch_time_series(
        &self,
        index: &str,
        field: &str,
        range: &TimeRange,
    ) -> ConnectorResult<Vec<MetricPoint>> {
        let body = json!({
            "size": 0,
            "query": {
                "range": {
                    "@timestamp": {
                        "gte": range.from.to_rfc3339(),
                        "lte": range.to.to_rfc3339()
                    }
                }
            },
            "aggs": {
                "time_buckets": {
                    "date_histogram": { "field": "@timestamp", "fixed_interval": "5m" },
                    "aggs": { "avg_value": { "avg": { "field": field } } }
                }
            }
        });

        let result = self.search(index, body).await?;

        let mut points = Vec::new();
        for bucket in buckets_at(&result, "/aggregations/time_buckets/buckets")? {
            let timestamp = bucket
                .get("key")
                .and_then(Value::as_i64)
                .ok_or_else(|| ConnectorError::missing("time_buckets.key"))?;
            // Empty histogram buckets carry a null average.
            let value = bucket
                .pointer("/avg_value/value")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            points.push(MetricPoint { timestamp, value });
        }
        Ok(points)
    }

    async fn fetch_application_metrics(&self, index: &str) -> ConnectorResult<HashMap<String, f64>> {
        let body = json!({
            "size": 0,
            "query": { "range": { "@timestamp": { "gte": "now-5m" } } },
            "aggs": {
                "avg_response_time": { "avg": { "field": "response_time" } },
                "request_count": { "value_count": { "field": "request_id" } },
                "status_codes": {
                    "terms": { "field": "status_code", "size": 10 }
                }
            }
        });

        let result = self.search(index, body).await?;

        let mut metrics = HashMap::new();
        metrics.insert(
            "avg_response_time".to_string(),
            result
                .pointer("/aggregations/avg_response_time/value")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        );
        metrics.insert(
            "request_count".to_string(),
            number_at(&result, "/aggregations/request_count/value")?,
        );

        for bucket in buckets_at(&result, "/aggregations/status_codes/buckets")? {
            let name = format!("status_{}", bucket_key(bucket));
            metrics.insert(name, doc_count(bucket));
        }
        Ok(metrics)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

fn number_at(body: &Value, pointer: &str) -> ConnectorResult<f64> {
    body.pointer(pointer)
        .and_then(Value::as_f64)
        .ok_or_else(|| ConnectorError::missing(pointer.trim_start_matches('/')))
}

fn buckets_at<'a>(body: &'a Value, pointer: &str) -> ConnectorResult<&'a Vec<Value>> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| ConnectorError::missing(pointer.trim_start_matches('/')))
}

/// Terms-bucket keys come back as strings for keyword fields and as
/// numbers for numeric fields; both synthesize into flat metric names.
fn bucket_key(bucket: &Value) -> String {
    match bucket.get("key") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn doc_count(bucket: &Value) -> f64 {
    bucket.get("doc_count").and_then(Value::as_f64).unwrap_or(0.0)
}
