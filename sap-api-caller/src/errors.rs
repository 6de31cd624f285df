use crate::config::ValidationError;
use thiserror::Error;

/// Result type alias for caller operations
pub type Result<T, E = CallerError> = std::result::Result<T, E>;

/// Errors that end a single fetch-and-publish pipeline
#[derive(Error, Debug)]
pub enum CallerError {
    /// The HTTP call could not be completed or its body could not be read
    #[error("API request error: {0}")]
    ApiRequest(#[source] reqwest::Error),

    /// The response body did not have the expected record shape
    #[error("convert error: {0}")]
    Convert(#[from] ConvertError),

    /// The sink rejected or failed to deliver the envelope
    #[error("publish error: {0}")]
    Publish(#[from] SinkError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("invalid caller configuration: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors raised while turning a raw OData response into records
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("cannot convert to {entity}. unmarshal error: {source}")]
    Unmarshal {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("result data does not exist")]
    NoResults,
}

/// Errors returned by an output sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("output channel closed for queue {0}")]
    Closed(String),

    #[error("could not serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink rejected message: {0}")]
    Rejected(String),
}
