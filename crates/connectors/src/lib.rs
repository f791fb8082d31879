//! # Mosaiq connectors
//!
//! Adapters translating three external systems into the gateway's flat
//! metric shape: public HTTP APIs (weather, crypto prices, repository
//! stats), a PostgreSQL metrics table, and Elasticsearch log/application
//! aggregations.
//!
//! Every connector call returns a tagged [`ConnectorResult`]; deciding
//! whether a failure degrades to "no data" is the caller's business, not
//! the connector's.

pub mod api;
pub mod elastic;
pub mod error;
pub mod postgres;
pub mod source;

pub use api::{ApiConnector, ApiConnectorConfig};
pub use elastic::{ElasticConfig, ElasticMetrics};
pub use error::{ConnectorError, ConnectorResult};
pub use postgres::{PostgresConfig, PostgresMetrics};
pub use source::{ApiSource, DbSource, LogSource};
