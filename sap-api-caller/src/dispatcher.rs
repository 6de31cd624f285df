//! Fan-out of one dispatch call into per-resource fetch-and-publish pipelines.
//!
//! Each accept-list entry is looked up in [`PIPELINES`]. Recognized entries run
//! their pipeline; anything else is ignored. A pipeline fetches one entity set,
//! converts it and publishes it:
//!
//! ```text
//! START -> FETCHING -> FETCH_FAILED
//!                   -> FETCHED -> PUBLISHING -> PUBLISH_FAILED
//!                                            -> DONE
//! ```
//!
//! Failures are logged and end only the pipeline they happen in. Nothing is
//! reported back to the caller of [`SapApiCaller::dispatch`].

use crate::config::{CallerConfig, ExecutionMode, ValidationError};
use crate::errors::{CallerError, ConvertError};
use crate::fetcher::ResourceFetcher;
use crate::formatter::{convert_to_product_group, convert_to_product_group_text};
use crate::metrics_defs::{DISPATCH_ACCEPTED, PIPELINE_OUTCOME};
use crate::publisher::ResultPublisher;
use crate::query::RequestSpec;
use crate::sink::OutputSink;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use tokio::task::JoinSet;

type PipelineFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Pipeline = fn(SapApiCaller, Arc<DispatchRequest>) -> PipelineFuture;

/// Accept-list names and the pipeline each one runs.
///
/// `base` and `localized-text` are the primary names; `ProductGroup` and
/// `ProductGroupName` are the names used by existing queue producers.
static PIPELINES: LazyLock<IndexMap<&'static str, Pipeline>> = LazyLock::new(|| {
    IndexMap::from([
        ("base", product_group_pipeline as Pipeline),
        ("localized-text", product_group_text_pipeline as Pipeline),
        ("ProductGroup", product_group_pipeline as Pipeline),
        ("ProductGroupName", product_group_text_pipeline as Pipeline),
    ])
});

fn product_group_pipeline(caller: SapApiCaller, request: Arc<DispatchRequest>) -> PipelineFuture {
    Box::pin(async move { caller.product_group(&request.material_group).await })
}

fn product_group_text_pipeline(
    caller: SapApiCaller,
    request: Arc<DispatchRequest>,
) -> PipelineFuture {
    Box::pin(async move {
        caller
            .product_group_text(&request.language, &request.material_group_name)
            .await
    })
}

/// Arguments of one dispatch call.
///
/// # Example
/// ```json
/// {
///   "material_group": "A001",
///   "language": "EN",
///   "material_group_name": "Pumps",
///   "accepter": ["base", "localized-text"]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub material_group: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub material_group_name: String,
    #[serde(default)]
    pub accepter: Vec<String>,
}

struct CallerInner {
    fetcher: ResourceFetcher,
    publisher: ResultPublisher,
    execution_mode: ExecutionMode,
}

/// Entry point for product group reads.
///
/// Cheap to clone; clones share the HTTP client, the sink and the configuration.
#[derive(Clone)]
pub struct SapApiCaller {
    inner: Arc<CallerInner>,
}

impl SapApiCaller {
    /// `api_key` is sent as the `APIKey` header on every request.
    pub fn new(
        config: &CallerConfig,
        api_key: String,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, CallerError> {
        config.validate()?;

        let destination = config
            .output_queues
            .first()
            .cloned()
            .ok_or(ValidationError::NoOutputQueues)?;
        let fetcher =
            ResourceFetcher::new(config.base_url.to_string(), api_key, config.http_timeout())?;

        Ok(Self {
            inner: Arc::new(CallerInner {
                fetcher,
                publisher: ResultPublisher::new(sink, destination),
                execution_mode: config.execution_mode,
            }),
        })
    }

    /// Runs the pipelines selected by `accepter` and waits for all of them.
    pub async fn dispatch<S: AsRef<str>>(
        &self,
        material_group: &str,
        language: &str,
        material_group_name: &str,
        accepter: &[S],
    ) {
        self.dispatch_request(DispatchRequest {
            material_group: material_group.to_string(),
            language: language.to_string(),
            material_group_name: material_group_name.to_string(),
            accepter: accepter.iter().map(|a| a.as_ref().to_string()).collect(),
        })
        .await
    }

    pub async fn dispatch_request(&self, request: DispatchRequest) {
        let mut selected = Vec::with_capacity(request.accepter.len());
        for name in &request.accepter {
            match PIPELINES.get(name.as_str()) {
                Some(pipeline) => {
                    shared::counter!(DISPATCH_ACCEPTED, "recognized" => "true").increment(1);
                    selected.push(*pipeline);
                }
                None => {
                    shared::counter!(DISPATCH_ACCEPTED, "recognized" => "false").increment(1);
                    tracing::debug!(name = %name, "Ignoring unrecognized accept-list entry");
                }
            }
        }

        if selected.is_empty() {
            return;
        }

        let request = Arc::new(request);
        match self.inner.execution_mode {
            ExecutionMode::Parallel => self.run_parallel(selected, request).await,
            ExecutionMode::Sequential => {
                for pipeline in selected {
                    pipeline(self.clone(), request.clone()).await;
                }
            }
        }
    }

    /// Spawns one task per pipeline and joins all of them. A failing or
    /// panicking pipeline does not cancel its siblings.
    async fn run_parallel(&self, pipelines: Vec<Pipeline>, request: Arc<DispatchRequest>) {
        let mut join_set = JoinSet::new();
        for pipeline in pipelines {
            join_set.spawn(pipeline(self.clone(), request.clone()));
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                tracing::error!("Pipeline task panicked: {e}");
            }
        }
    }

    /// Reads `A_ProductGroup` filtered by material group and publishes it.
    pub async fn product_group(&self, material_group: &str) {
        let spec = RequestSpec::ProductGroup {
            material_group: material_group.to_string(),
        };
        self.run_pipeline(spec, convert_to_product_group).await
    }

    /// Reads `A_ProductGroupText` filtered by language and name substring and publishes it.
    pub async fn product_group_text(&self, language: &str, material_group_name: &str) {
        let spec = RequestSpec::ProductGroupText {
            language: language.to_string(),
            material_group_name: material_group_name.to_string(),
        };
        self.run_pipeline(spec, convert_to_product_group_text).await
    }

    async fn run_pipeline<T>(
        &self,
        spec: RequestSpec,
        convert: fn(&[u8]) -> Result<Vec<T>, ConvertError>,
    ) where
        T: Serialize + Debug + Send + Sync,
    {
        let function = spec.function();
        let outcome = match self.fetch_and_publish(&spec, convert).await {
            Ok(()) => "done",
            Err(e) => {
                tracing::error!(function, error = %e, "Pipeline failed");
                match e {
                    CallerError::Publish(_) => "publish_failed",
                    _ => "fetch_failed",
                }
            }
        };
        shared::counter!(PIPELINE_OUTCOME, "function" => function, "outcome" => outcome)
            .increment(1);
    }

    async fn fetch_and_publish<T>(
        &self,
        spec: &RequestSpec,
        convert: fn(&[u8]) -> Result<Vec<T>, ConvertError>,
    ) -> Result<(), CallerError>
    where
        T: Serialize + Debug + Send + Sync,
    {
        let records = self.inner.fetcher.fetch(spec, convert).await?;
        self.inner.publisher.publish(spec.function(), &records).await
    }
}
