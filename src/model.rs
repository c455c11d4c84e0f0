// Core structs: reference tables, advertisement ids, wire shapes, errors
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One `{name, value}` pair as returned by the reference-list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefItem {
    pub name: String,
    pub value: i64,
}

/// A reference lookup table (makes, models, body styles, gearboxes, ...).
///
/// Order is whatever the service returned; lookups scan linearly since the
/// tables are small (tens to a few hundred entries).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable(pub Vec<RefItem>);

impl ReferenceTable {
    pub fn id_of(&self, name: &str) -> Option<i64> {
        self.0.iter().find(|item| item.name == name).map(|item| item.value)
    }

    /// Reverse lookup: service id back to the human label.
    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.0
            .iter()
            .find(|item| item.value == id)
            .map(|item| item.name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|item| item.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Opaque advertisement identifier. The search endpoint has returned these
/// both as JSON numbers and as strings, so accept either and keep the
/// textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdvertId(String);

impl AdvertId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdvertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdvertId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for AdvertId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for AdvertId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "advertisement id must be a number or string, got {other}"
            ))),
        }
    }
}

impl Serialize for AdvertId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// One page of search results: the declared total and this page's ids.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub count: u64,
    #[serde(default)]
    pub ids: Vec<AdvertId>,
}

/// Response of the average-price endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragePrice {
    pub total: u64,
    pub arithmetic_mean: f64,
    pub inter_quartile_mean: f64,
    #[serde(default)]
    pub percentiles: serde_json::Value,
}

/// Raw detail record for one advertisement, with the fetch wall-clock time.
#[derive(Debug, Clone)]
pub struct AdvertRecord {
    pub id: AdvertId,
    pub raw: serde_json::Value,
    pub elapsed: Duration,
}

/// Normalized flat record: canonical field name -> scalar value, in the
/// configured field order. Every record produced in a run carries exactly
/// the same fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, serde_json::Value)>,
}

impl FlatRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, serde_json::Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-200 response with a decoded `{error: {code, message}}` body.
    #[error("service error {code}: {message}")]
    Api { code: String, message: String },
    /// The designated hard-stop status: never retried, never recovered.
    #[error("authorization rejected: {0}")]
    AuthRejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Entry exists and is fresh but cannot be decoded. Deliberately fatal
    /// for the read; never silently refetched.
    #[error("corrupted cache entry '{path}': {reason}")]
    Corrupt { path: String, reason: String },
    #[error("cache entry '{path}' is format version {found}, expected {expected}")]
    VersionMismatch {
        path: String,
        found: u32,
        expected: u32,
    },
    #[error("cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// A reference refresh failed; propagated unchanged from the fetch.
    #[error(transparent)]
    Fetch(#[from] ClientError),
}

#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("unknown {kind} '{name}'")]
    UnknownName {
        kind: &'static str,
        name: String,
        known: Vec<String>,
    },
    #[error("a car make is required (e.g. --make Ford)")]
    MakeRequired,
    #[error("a car make is required before a model (e.g. --make Ford)")]
    MakeRequiredForModel,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown output field '{0}' in configuration")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Umbrella error for the run flow in `main`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("search error: no advertisement details could be fetched")]
    NoDetails,
}
