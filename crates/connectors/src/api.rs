//! External-API connectors: weather, cryptocurrency prices and repository
//! statistics. One outbound GET each, fixed endpoint, fixed timeout, no
//! retries.

use crate::error::{ConnectorError, ConnectorResult};
use crate::source::ApiSource;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Per-call timeout on every external API request.
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the API connector family.
#[derive(Debug, Clone)]
pub struct ApiConnectorConfig {
    pub weather_url: String,
    pub crypto_url: String,
    pub github_url: String,
    /// Geographic point for the weather fetch.
    pub latitude: f64,
    pub longitude: f64,
    /// Coin identifiers quoted against USD.
    pub coins: Vec<String>,
    /// `owner/repo` the statistics fetch addresses.
    pub repo: String,
}

impl Default for ApiConnectorConfig {
    fn default() -> Self {
        Self {
            weather_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            crypto_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            github_url: "https://api.github.com/repos".to_string(),
            latitude: 44.539051,
            longitude: 18.477280,
            coins: vec!["bitcoin".to_string(), "ethereum".to_string()],
            repo: "torvalds/linux".to_string(),
        }
    }
}

/// Client for the three public-API sources.
#[derive(Debug, Clone)]
pub struct ApiConnector {
    client: reqwest::Client,
    config: ApiConnectorConfig,
}

impl ApiConnector {
    pub fn new(config: ApiConnectorConfig) -> ConnectorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent(concat!("mosaiq/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Current conditions at the configured point: `temperature`,
    /// `wind_speed`, `humidity`.
    pub async fn weather(&self, latitude: f64, longitude: f64) -> ConnectorResult<HashMap<String, f64>> {
        let body: Value = self
            .client
            .get(&self.config.weather_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,wind_speed_10m,relative_humidity_2m".to_string(),
                ),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut metrics = HashMap::new();
        metrics.insert("temperature".to_string(), number_at(&body, "/current/temperature_2m")?);
        metrics.insert("wind_speed".to_string(), number_at(&body, "/current/wind_speed_10m")?);
        metrics.insert("humidity".to_string(), number_at(&body, "/current/relative_humidity_2m")?);
        Ok(metrics)
    }

    /// USD quotes for the given coins. Coins the upstream does not know are
    /// silently absent from the result.
    pub async fn crypto(&self, coins: &[String]) -> ConnectorResult<HashMap<String, f64>> {
        let body: Value = self
            .client
            .get(&self.config.crypto_url)
            .query(&[("ids", coins.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut metrics = HashMap::new();
        for coin in coins {
            if let Some(price) = body.get(coin).and_then(|c| c.get("usd")).and_then(Value::as_f64) {
                metrics.insert(coin.clone(), price);
            }
        }
        Ok(metrics)
    }

    /// Repository statistics: `stars`, `forks`, `open_issues`, `watchers`.
    pub async fn github(&self, repo: &str) -> ConnectorResult<HashMap<String, f64>> {
        let url = format!("{}/{}", self.config.github_url.trim_end_matches('/'), repo);
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut metrics = HashMap::new();
        metrics.insert("stars".to_string(), number_at(&body, "/stargazers_count")?);
        metrics.insert("forks".to_string(), number_at(&body, "/forks_count")?);
        metrics.insert("open_issues".to_string(), number_at(&body, "/open_issues_count")?);
        metrics.insert("watchers".to_string(), number_at(&body, "/watchers_count")?);
        Ok(metrics)
    }
}

#[async_trait]
impl ApiSource for ApiConnector {
    async fn fetch_weather(&self) -> ConnectorResult<HashMap<String, f64>> {
        self.weather(self.config.latitude, self.config.longitude).await
    }

    async fn fetch_crypto(&self) -> ConnectorResult<HashMap<String, f64>> {
        self.crypto(&self.config.coins).await
    }

    async fn fetch_github(&self) -> ConnectorResult<HashMap<String, f64>> {
        self.github(&self.config.repo).await
    }
}

/// Extract a number at a JSON pointer, tagging the failure with the path.
fn number_at(body: &Value, pointer: &str) -> ConnectorResult<f64> {
    body.pointer(pointer)
        .and_then(Value::as_f64)
        .ok_or_else(|| ConnectorError::missing(pointer.trim_start_matches('/')))
}
