use anyhow::{Context, Result};
use mosaiq_connectors::{
    ApiConnector, ApiConnectorConfig, ApiSource, DbSource, ElasticConfig, ElasticMetrics,
    LogSource, PostgresConfig, PostgresMetrics,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub postgres: PostgresSettings,

    #[serde(default)]
    pub elastic: ElasticSettings,

    #[serde(default)]
    pub apis: ApiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresSettings {
    #[serde(default = "default_pg_host")]
    pub host: String,

    #[serde(default = "default_pg_port")]
    pub port: u16,

    #[serde(default = "default_pg_database")]
    pub database: String,

    /// Overridden by `PG_USER` when set.
    #[serde(default)]
    pub user: String,

    /// Overridden by `PG_PASSWORD` when set.
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticSettings {
    #[serde(default = "default_elastic_url")]
    pub url: String,

    /// Overridden by `ELASTIC_USER` when set.
    #[serde(default)]
    pub user: Option<String>,

    /// Overridden by `ELASTIC_PASS` when set.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_coins")]
    pub coins: Vec<String>,

    #[serde(default = "default_repo")]
    pub repo: String,
}

fn default_pg_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_database() -> String {
    "metrics_db".to_string()
}

fn default_elastic_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_latitude() -> f64 {
    44.539051
}

fn default_longitude() -> f64 {
    18.477280
}

fn default_coins() -> Vec<String> {
    vec!["bitcoin".to_string(), "ethereum".to_string()]
}

fn default_repo() -> String {
    "torvalds/linux".to_string()
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: default_pg_host(),
            port: default_pg_port(),
            database: default_pg_database(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self {
            url: default_elastic_url(),
            user: None,
            password: None,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            coins: default_coins(),
            repo: default_repo(),
        }
    }
}

impl ServerConfig {
    /// Load the TOML config if present, then overlay credentials from the
    /// environment. Missing credentials stay empty and surface later as
    /// connector-level failures, not startup errors.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(user) = std::env::var("PG_USER") {
            self.postgres.user = user;
        }
        if let Ok(password) = std::env::var("PG_PASSWORD") {
            self.postgres.password = password;
        }
        if let Ok(user) = std::env::var("ELASTIC_USER") {
            self.elastic.user = Some(user);
        }
        if let Ok(password) = std::env::var("ELASTIC_PASS") {
            self.elastic.password = Some(password);
        }
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres.host.clone(),
            port: self.postgres.port,
            database: self.postgres.database.clone(),
            user: self.postgres.user.clone(),
            password: self.postgres.password.clone(),
            ..Default::default()
        }
    }

    pub fn elastic_config(&self) -> ElasticConfig {
        ElasticConfig {
            url: self.elastic.url.clone(),
            username: self.elastic.user.clone(),
            password: self.elastic.password.clone(),
        }
    }

    pub fn api_config(&self) -> ApiConnectorConfig {
        ApiConnectorConfig {
            latitude: self.apis.latitude,
            longitude: self.apis.longitude,
            coins: self.apis.coins.clone(),
            repo: self.apis.repo.clone(),
            ..Default::default()
        }
    }
}

/// Application state shared across handlers. Connector instances are
/// injected here once; handlers only ever see the source traits, so tests
/// swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ApiSource>,
    pub db: Arc<dyn DbSource>,
    pub logs: Arc<dyn LogSource>,
}

impl AppState {
    pub async fn new(config: &ServerConfig) -> Result<Self> {
        let api = ApiConnector::new(config.api_config())
            .context("Failed to build API connector")?;
        let db = PostgresMetrics::new(&config.postgres_config());
        let logs = ElasticMetrics::connect(&config.elastic_config())
            .await
            .context("Failed to build search-engine connector")?;

        Ok(Self::with_sources(Arc::new(api), Arc::new(db), Arc::new(logs)))
    }

    pub fn with_sources(
        api: Arc<dyn ApiSource>,
        db: Arc<dyn DbSource>,
        logs: Arc<dyn LogSource>,
    ) -> Self {
        Self { api, db, logs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.postgres.database, "metrics_db");
        assert_eq!(config.elastic.url, "http://localhost:9200");
        assert_eq!(config.apis.coins, vec!["bitcoin", "ethereum"]);
        assert_eq!(config.apis.repo, "torvalds/linux");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [postgres]
            host = "db.internal"
            port = 5433

            [apis]
            repo = "rust-lang/rust"
            "#,
        )
        .unwrap();
        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.postgres.port, 5433);
        assert_eq!(config.postgres.database, "metrics_db");
        assert_eq!(config.apis.repo, "rust-lang/rust");
        assert_eq!(config.apis.latitude, default_latitude());
    }
}
