use crate::config::AppState;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the gateway server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the gateway router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/search", post(handlers::search))
        .route("/query", post(handlers::query))
        .route("/annotations", post(handlers::annotations))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use mosaiq_connectors::{
        ApiSource, ConnectorError, ConnectorResult, DbSource, LogSource,
    };
    use mosaiq_core::{AggregatedMetric, MetricPoint, MetricSample, TimeRange};
    use serde_json::Value;
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct FakeApi {
        crypto: ConnectorResult<HashMap<String, f64>>,
    }

    impl FakeApi {
        fn with_bitcoin(price: f64) -> Self {
            let mut crypto = HashMap::new();
            crypto.insert("bitcoin".to_string(), price);
            Self { crypto: Ok(crypto) }
        }

        fn failing() -> Self {
            Self {
                crypto: Err(ConnectorError::UnexpectedShape("boom".to_string())),
            }
        }
    }

    #[async_trait]
    impl ApiSource for FakeApi {
        async fn fetch_weather(&self) -> ConnectorResult<HashMap<String, f64>> {
            let mut map = HashMap::new();
            map.insert("temperature".to_string(), 21.0);
            Ok(map)
        }

        async fn fetch_crypto(&self) -> ConnectorResult<HashMap<String, f64>> {
            match &self.crypto {
                Ok(map) => Ok(map.clone()),
                Err(_) => Err(ConnectorError::UnexpectedShape("boom".to_string())),
            }
        }

        async fn fetch_github(&self) -> ConnectorResult<HashMap<String, f64>> {
            Ok(HashMap::new())
        }
    }

    struct FakeDb {
        points: Vec<MetricPoint>,
        reachable: bool,
    }

    #[async_trait]
    impl DbSource for FakeDb {
        async fn fetch_recent(&self) -> ConnectorResult<Vec<MetricSample>> {
            Ok(Vec::new())
        }

        async fn fetch_aggregated(&self) -> ConnectorResult<HashMap<String, AggregatedMetric>> {
            Ok(HashMap::new())
        }

        async fn fetch_time_series(
            &self,
            _metric: &str,
            _range: &TimeRange,
        ) -> ConnectorResult<Vec<MetricPoint>> {
            Ok(self.points.clone())
        }

        async fn ping(&self) -> bool {
            self.reachable
        }
    }

    struct FakeLogs {
        points: Vec<MetricPoint>,
        connected: bool,
    }

    #[async_trait]
    impl LogSource for FakeLogs {
        async fn fetch_log_metrics(
            &self,
            _index: &str,
            _time_field: &str,
        ) -> ConnectorResult<HashMap<String, f64>> {
            Ok(HashMap::new())
        }

        async fn fetch_time_series(
            &self,
            _index: &str,
            _field: &str,
            _range: &TimeRange,
        ) -> ConnectorResult<Vec<MetricPoint>> {
            if !self.connected {
                return Err(ConnectorError::Disconnected);
            }
            Ok(self.points.clone())
        }

        async fn fetch_application_metrics(
            &self,
            _index: &str,
        ) -> ConnectorResult<HashMap<String, f64>> {
            Ok(HashMap::new())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    fn router_with(api: FakeApi, db: FakeDb, logs: FakeLogs) -> Router {
        create_router(AppState::with_sources(
            Arc::new(api),
            Arc::new(db),
            Arc::new(logs),
        ))
    }

    fn default_router() -> Router {
        router_with(
            FakeApi::with_bitcoin(64000.0),
            FakeDb {
                points: Vec::new(),
                reachable: true,
            },
            FakeLogs {
                points: Vec::new(),
                connected: true,
            },
        )
    }

    async fn post_json(router: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn query_body(from: &str, to: &str, targets: &[&str]) -> Value {
        serde_json::json!({
            "range": { "from": from, "to": to },
            "targets": targets.iter().map(|t| serde_json::json!({ "target": t })).collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn health_reports_all_datasources() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = default_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["datasources"]["postgresql"], true);
        assert_eq!(body["datasources"]["elasticsearch"], true);
        assert_eq!(body["datasources"]["apis"], true);
    }

    #[tokio::test]
    async fn health_degrades_to_false_never_5xx() {
        let router = router_with(
            FakeApi::with_bitcoin(1.0),
            FakeDb {
                points: Vec::new(),
                reachable: false,
            },
            FakeLogs {
                points: Vec::new(),
                connected: false,
            },
        );
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["datasources"]["postgresql"], false);
        assert_eq!(body["datasources"]["elasticsearch"], false);
        assert_eq!(body["datasources"]["apis"], true);
    }

    #[tokio::test]
    async fn search_is_idempotent_and_ordered() {
        let (status, first) = post_json(default_router(), "/search", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = post_json(default_router(), "/search", Value::Null).await;
        assert_eq!(first, second);

        let names = first.as_array().unwrap();
        assert!(names.contains(&Value::String("api.crypto.bitcoin".to_string())));
        assert!(names.contains(&Value::String("postgres.cpu_usage".to_string())));
        assert!(names.contains(&Value::String("elastic.total_logs".to_string())));
    }

    #[tokio::test]
    async fn query_replicates_api_value_across_grid() {
        let body = query_body(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:10:00Z",
            &["api.crypto.bitcoin"],
        );
        let (status, response) = post_json(default_router(), "/query", body).await;
        assert_eq!(status, StatusCode::OK);

        let entries = response.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["target"], "api.crypto.bitcoin");

        let datapoints = entries[0]["datapoints"].as_array().unwrap();
        // Minutes 0, 5 and 10.
        assert_eq!(datapoints.len(), 3);

        let timestamps: Vec<i64> = datapoints
            .iter()
            .map(|dp| dp[1].as_i64().unwrap())
            .collect();
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(timestamps[0], 1704067200000);
        assert_eq!(timestamps[1], 1704067500000);
        assert_eq!(timestamps[2], 1704067800000);

        // Jitter stays within the crypto amplitude.
        for dp in datapoints {
            let value = dp[0].as_f64().unwrap();
            assert!((value - 64000.0).abs() <= 50.0);
        }
    }

    #[tokio::test]
    async fn query_echoes_every_target() {
        let body = query_body(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:10:00Z",
            &["api.crypto.bitcoin", "postgres.cpu_usage", "unknown.thing"],
        );
        let (status, response) = post_json(default_router(), "/query", body).await;
        assert_eq!(status, StatusCode::OK);

        let entries = response.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["target"], "api.crypto.bitcoin");
        assert_eq!(entries[1]["target"], "postgres.cpu_usage");
        assert_eq!(entries[2]["target"], "unknown.thing");
        // Unmatched prefix degrades to an empty list, not an error.
        assert_eq!(entries[2]["datapoints"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn query_maps_database_series() {
        let router = router_with(
            FakeApi::with_bitcoin(1.0),
            FakeDb {
                points: vec![
                    MetricPoint {
                        timestamp: 1704067200000,
                        value: 0.42,
                    },
                    MetricPoint {
                        timestamp: 1704067500000,
                        value: 0.61,
                    },
                ],
                reachable: true,
            },
            FakeLogs {
                points: Vec::new(),
                connected: true,
            },
        );
        let body = query_body(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:10:00Z",
            &["postgres.cpu_usage"],
        );
        let (_, response) = post_json(router, "/query", body).await;

        let datapoints = response[0]["datapoints"].as_array().unwrap();
        assert_eq!(datapoints.len(), 2);
        assert_eq!(datapoints[0][0], 0.42);
        assert_eq!(datapoints[0][1], 1704067200000i64);
    }

    #[tokio::test]
    async fn query_maps_search_series() {
        let router = router_with(
            FakeApi::with_bitcoin(1.0),
            FakeDb {
                points: Vec::new(),
                reachable: true,
            },
            FakeLogs {
                points: vec![MetricPoint {
                    timestamp: 1704067200000,
                    value: 37.5,
                }],
                connected: true,
            },
        );
        let body = query_body(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:10:00Z",
            &["elastic.avg_response_time"],
        );
        let (_, response) = post_json(router, "/query", body).await;

        let datapoints = response[0]["datapoints"].as_array().unwrap();
        assert_eq!(datapoints.len(), 1);
        assert_eq!(datapoints[0][0], 37.5);
    }

    #[tokio::test]
    async fn failed_source_degrades_to_empty_with_200() {
        let router = router_with(
            FakeApi::failing(),
            FakeDb {
                points: Vec::new(),
                reachable: true,
            },
            FakeLogs {
                points: Vec::new(),
                connected: true,
            },
        );
        let body = query_body(
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:10:00Z",
            &["api.crypto.bitcoin"],
        );
        let (status, response) = post_json(router, "/query", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response[0]["datapoints"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn reversed_range_yields_empty_datapoints() {
        let body = query_body(
            "2024-01-01T00:10:00Z",
            "2024-01-01T00:00:00Z",
            &["api.crypto.bitcoin"],
        );
        let (status, response) = post_json(default_router(), "/query", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response[0]["datapoints"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_query_is_rejected() {
        let (status, _) = post_json(
            default_router(),
            "/query",
            serde_json::json!({ "targets": [] }),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn annotations_is_an_empty_array() {
        let (status, body) = post_json(default_router(), "/annotations", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }
}
