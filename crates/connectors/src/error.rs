//! Error types for connector calls.

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Error raised at a connector boundary. Callers see a tagged failure and
/// can distinguish a dead upstream from a legitimately empty result.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Outbound HTTP request failed (network, timeout, non-2xx).
    #[error("upstream HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream answered, but without a field we rely on.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The search engine was unreachable at startup; the connector stays
    /// disconnected for the process lifetime.
    #[error("source is disconnected")]
    Disconnected,

    /// Bad connector configuration (unparseable URL and the like).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConnectorError {
    /// Missing-field helper for response mapping code.
    pub fn missing(field: &str) -> Self {
        Self::UnexpectedShape(format!("missing field `{field}`"))
    }
}
