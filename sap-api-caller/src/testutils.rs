use crate::errors::SinkError;
use crate::sink::{OutputSink, Payload};
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request as seen by the mock OData server
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn filter(&self) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == "$filter")
            .map(|(_, v)| v.clone())
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).cloned()
    }
}

pub struct MockResponse {
    status: u16,
    body: String,
}

impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

pub struct MockServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/sap/opu/odata/sap", self.port)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock HTTP server that records every request and answers with `respond`
pub async fn start_mock_server<F>(respond: F) -> MockServer
where
    F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let recorded = recorded.clone();
            let respond = respond.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let recorded = recorded.clone();
                    let respond = respond.clone();
                    async move {
                        let request = RecordedRequest {
                            path: req.uri().path().to_string(),
                            query: url::form_urlencoded::parse(
                                req.uri().query().unwrap_or("").as_bytes(),
                            )
                            .into_owned()
                            .collect(),
                            headers: req
                                .headers()
                                .iter()
                                .map(|(k, v)| {
                                    (k.to_string(), v.to_str().unwrap_or("").to_string())
                                })
                                .collect(),
                        };
                        let response = respond(&request);
                        recorded.lock().unwrap().push(request);

                        let mut http_response = Response::new(Full::new(Bytes::from(response.body)));
                        *http_response.status_mut() = StatusCode::from_u16(response.status).unwrap();
                        Ok::<_, Infallible>(http_response)
                    }
                });

                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    MockServer { port, requests }
}

/// Sink that records every payload, or rejects every payload when failing
pub struct RecordingSink {
    fail: bool,
    sent: Mutex<Vec<(String, Payload)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, Payload)> {
        self.sent.lock().unwrap().clone()
    }

    /// Values of the `function` field of every recorded payload, sorted
    pub fn functions(&self) -> Vec<String> {
        let mut functions: Vec<String> = self
            .sent()
            .iter()
            .filter_map(|(_, p)| p.get("function").and_then(|f| f.as_str()))
            .map(String::from)
            .collect();
        functions.sort();
        functions
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn send(&self, destination: &str, payload: Payload) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Rejected("queue unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), payload));
        Ok(())
    }
}
