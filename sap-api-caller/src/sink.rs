//! Output sinks that deliver published envelopes to a queue.

use crate::errors::SinkError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::Write;
use tokio::sync::mpsc;

/// JSON object delivered to a sink.
pub type Payload = Map<String, Value>;

/// Delivers a payload to a named destination queue.
///
/// Implementations are shared between concurrently running pipelines and are
/// responsible for their own synchronization.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn send(&self, destination: &str, payload: Payload) -> Result<(), SinkError>;
}

/// Forwards every message into an in-process channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, Payload)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Payload)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn send(&self, destination: &str, payload: Payload) -> Result<(), SinkError> {
        self.tx
            .send((destination.to_string(), payload))
            .map_err(|_| SinkError::Closed(destination.to_string()))
    }
}

/// Writes one JSON line per message to stdout.
pub struct StdoutSink;

#[derive(serde::Serialize)]
struct StdoutLine<'a> {
    queue: &'a str,
    payload: &'a Payload,
}

#[async_trait]
impl OutputSink for StdoutSink {
    async fn send(&self, destination: &str, payload: Payload) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&StdoutLine {
            queue: destination,
            payload: &payload,
        })?;
        line.push(b'\n');

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&line)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Payload {
        let mut payload = Payload::new();
        payload.insert("function".to_string(), json!("ProductGroupProductGroup"));
        payload.insert("message".to_string(), json!([]));
        payload
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new();
        sink.send("queue-a", payload()).await.unwrap();

        let (queue, received) = rx.recv().await.unwrap();
        assert_eq!(queue, "queue-a");
        assert_eq!(received, payload());
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        let err = sink.send("queue-a", payload()).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed(q) if q == "queue-a"));
    }

    #[tokio::test]
    async fn test_stdout_sink() {
        StdoutSink.send("queue-a", payload()).await.unwrap();
    }
}
