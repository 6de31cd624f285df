//! Reads product groups and their texts from the SAP `API_PRODUCTGROUP_SRV`
//! OData service and republishes them to an output queue.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod fetcher;
pub mod formatter;
pub mod metrics_defs;
pub mod publisher;
pub mod query;
pub mod sink;

#[cfg(test)]
mod testutils;

pub use config::{ApiKeySource, CallerConfig, ExecutionMode};
pub use dispatcher::{DispatchRequest, SapApiCaller};
pub use errors::{CallerError, ConvertError, SinkError};
pub use sink::{ChannelSink, OutputSink, Payload, StdoutSink};
