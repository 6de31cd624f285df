use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("At least one output queue is required")]
    NoOutputQueues,

    #[error("Empty output queue name")]
    EmptyQueueName,

    #[error("HTTP timeout cannot be 0")]
    InvalidTimeout,
}

#[derive(Error, Debug)]
pub enum ApiKeyError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("could not read API key from {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API key is empty")]
    Empty,
}

/// How the dispatcher runs the pipelines selected by one accept list
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    // Every selected pipeline runs as its own task
    #[default]
    Parallel,
    // Pipelines run one after the other in accept-list order
    Sequential,
}

/// Where the API key sent in the `APIKey` header comes from
#[derive(Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum ApiKeySource {
    Value { value: String },
    Env { name: String },
    File { path: PathBuf },
}

impl fmt::Debug for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeySource::Value { .. } => f.write_str("Value { value: <redacted> }"),
            ApiKeySource::Env { name } => f.debug_struct("Env").field("name", name).finish(),
            ApiKeySource::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

impl ApiKeySource {
    /// Reads the key once. Surrounding whitespace is stripped so key files
    /// with a trailing newline work.
    pub fn resolve(&self) -> Result<String, ApiKeyError> {
        let key = match self {
            ApiKeySource::Value { value } => value.clone(),
            ApiKeySource::Env { name } => {
                std::env::var(name).map_err(|_| ApiKeyError::MissingEnv(name.clone()))?
            }
            ApiKeySource::File { path } => {
                std::fs::read_to_string(path).map_err(|source| ApiKeyError::ReadFile {
                    path: path.clone(),
                    source,
                })?
            }
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ApiKeyError::Empty);
        }
        Ok(key.to_string())
    }
}

/// Caller configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CallerConfig {
    /// Base URL of the OData gateway, without the service segment
    ///
    /// Invalid URLs are rejected during config deserialization.
    pub base_url: Url,
    pub api_key: ApiKeySource,
    /// Queues results are published to. Only the first one is used.
    pub output_queues: Vec<String>,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// Per-request HTTP timeout. Requests have no deadline when unset.
    pub http_timeout_secs: Option<u64>,
}

impl CallerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.output_queues.is_empty() {
            return Err(ValidationError::NoOutputQueues);
        }
        if self.output_queues.iter().any(|q| q.is_empty()) {
            return Err(ValidationError::EmptyQueueName);
        }
        if self.http_timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}
