use crate::errors::{CallerError, SinkError};
use crate::sink::{OutputSink, Payload};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Tagged payload delivered to the output queue.
#[derive(Debug, Serialize)]
pub struct OutputEnvelope<'a, T> {
    /// Converted records
    pub message: &'a [T],
    /// Which fetch produced the records
    pub function: &'static str,
}

impl<T: Serialize> OutputEnvelope<'_, T> {
    pub fn to_payload(&self) -> Result<Payload, SinkError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            // A struct always serializes to an object
            other => Err(SinkError::Rejected(format!(
                "envelope is not a JSON object: {other}"
            ))),
        }
    }
}

/// Sends converted records to the first configured output queue.
#[derive(Clone)]
pub struct ResultPublisher {
    sink: Arc<dyn OutputSink>,
    destination: String,
}

impl ResultPublisher {
    pub fn new(sink: Arc<dyn OutputSink>, destination: String) -> Self {
        Self { sink, destination }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub async fn publish<T>(&self, function: &'static str, records: &[T]) -> Result<(), CallerError>
    where
        T: Serialize + Debug,
    {
        let envelope = OutputEnvelope {
            message: records,
            function,
        };
        let payload = envelope.to_payload()?;

        self.sink.send(&self.destination, payload).await?;

        tracing::info!(
            function,
            queue = %self.destination,
            message = ?records,
            "published"
        );
        Ok(())
    }
}
