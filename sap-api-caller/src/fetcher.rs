use crate::errors::{CallerError, ConvertError};
use crate::metrics_defs::FETCH_DURATION;
use crate::query::RequestSpec;
use http::header::ACCEPT;
use std::time::{Duration, Instant};

/// Header carrying the API key expected by the SAP API gateway
pub const API_KEY_HEADER: &str = "APIKey";

/// Issues GET requests against the OData service and converts the responses.
#[derive(Clone)]
pub struct ResourceFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ResourceFetcher {
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self, CallerError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(CallerError::HttpClient)?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Fetches the entity described by `spec` and converts the body with `convert`.
    ///
    /// The response status is not inspected: whatever body comes back is handed
    /// to `convert`, so error pages surface as conversion errors.
    pub async fn fetch<T>(
        &self,
        spec: &RequestSpec,
        convert: fn(&[u8]) -> Result<Vec<T>, ConvertError>,
    ) -> Result<Vec<T>, CallerError> {
        let url = spec.url(&self.base_url);
        let request = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json");
        let request = spec.apply_query(request);

        let started = Instant::now();
        let response = request.send().await.map_err(CallerError::ApiRequest)?;
        let status = response.status();
        let body = response.bytes().await.map_err(CallerError::ApiRequest)?;

        shared::histogram!(FETCH_DURATION, "api" => spec.api())
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            api = spec.api(),
            %status,
            bytes = body.len(),
            "received response"
        );

        Ok(convert(&body)?)
    }
}
