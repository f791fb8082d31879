use serde::{Deserialize, Serialize};

/// Which external API a target addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    Weather,
    Crypto,
    Github,
}

impl ApiKind {
    /// Jitter parameters used when replicating a single fetched value
    /// across the generated timestamp grid. Matches the amplitude each
    /// source's values move at: tenths of a degree, tens of dollars,
    /// a handful of stars.
    pub fn jitter_params(&self) -> (i64, f64) {
        match self {
            ApiKind::Weather => (10, 0.1),
            ApiKind::Crypto => (100, 1.0),
            ApiKind::Github => (20, 1.0),
        }
    }
}

/// Connector family selected by a target's first dot-delimited segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Api(ApiKind),
    Postgres,
    Elastic,
    /// Unmatched prefixes are not an error; the gateway answers them with
    /// an empty datapoint list.
    Unknown,
}

/// A parsed query target such as `api.crypto.bitcoin` or
/// `postgres.cpu_usage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    raw: String,
    family: Family,
    leaf: String,
}

impl Target {
    /// Parse a dot-delimited metric name. Parsing never fails: anything
    /// that does not match a known family becomes [`Family::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split('.');
        let family = match segments.next() {
            Some("api") => match segments.next() {
                Some("weather") => Family::Api(ApiKind::Weather),
                Some("crypto") => Family::Api(ApiKind::Crypto),
                Some("github") => Family::Api(ApiKind::Github),
                _ => Family::Unknown,
            },
            Some("postgres") => Family::Postgres,
            Some("elastic") => Family::Elastic,
            _ => Family::Unknown,
        };

        let leaf = raw.rsplit('.').next().unwrap_or(raw).to_string();

        Self {
            raw: raw.to_string(),
            family,
            leaf,
        }
    }

    /// The original target string, echoed verbatim in responses.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// The final segment, naming the specific metric within its family.
    pub fn leaf(&self) -> &str {
        &self.leaf
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
