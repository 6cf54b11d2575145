use anyhow::Result;
use async_trait::async_trait;
use prattle_core::net::{HttpClient, HttpRequest, HttpResponse, StreamingHttpResponse};
use prattle_core::operation::Operation;
use prattle_core::response::OperationResponse;
use prattle_core::session::SessionContext;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Network(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// HTTP client implementation using `ureq` for synchronous HTTP requests.
/// Since `ureq` is blocking, buffered requests are wrapped in
/// `tokio::task::spawn_blocking`.
#[derive(Debug, Clone, Default)]
pub struct UreqHttpClient;

impl UreqHttpClient {
    pub fn new() -> Self {
        Self
    }
}

fn send_blocking(request: HttpRequest) -> Result<ureq::http::Response<ureq::Body>> {
    let response = match request.method.as_str() {
        "GET" => {
            let mut req = ureq::get(&request.url);
            for (key, value) in &request.headers {
                req = req.header(key, value);
            }
            req.call()?
        }
        "POST" => {
            let mut req = ureq::post(&request.url);
            for (key, value) in &request.headers {
                req = req.header(key, value);
            }
            if let Some(body) = request.body {
                req.send(&body[..])?
            } else {
                req.send(&[])?
            }
        }
        method => {
            return Err(anyhow::anyhow!("Unsupported HTTP method: {}", method));
        }
    };
    Ok(response)
}

#[async_trait]
impl HttpClient for UreqHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        // Since ureq is blocking, we must use spawn_blocking
        tokio::task::spawn_blocking(move || {
            let response = send_blocking(request)?;
            let status_code = response.status().as_u16();
            let mut body = response.into_body();
            let body_bytes = body.read_to_vec()?;

            Ok(HttpResponse {
                status_code,
                body: body_bytes,
            })
        })
        .await?
    }

    fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse> {
        // Note: no spawn_blocking here — this is called FROM within
        // spawn_blocking by the push lane's read pump. The entire fetch and
        // parse happens on one blocking thread.
        let response = send_blocking(request)?;
        let status_code = response.status().as_u16();
        let reader = response.into_body().into_reader();

        Ok(StreamingHttpResponse {
            status_code,
            body: Box::new(reader),
        })
    }
}

/// The request/response lane: serializes an operation, decorates it with the
/// bearer header for the current identity, POSTs it, and parses the uniform
/// response shape. Pure forwarding — no retry, no mutation of the operation.
pub struct RequestLane {
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
    endpoint: String,
}

impl RequestLane {
    pub fn new(http: Arc<dyn HttpClient>, session: Arc<SessionContext>, endpoint: String) -> Self {
        Self {
            http,
            session,
            endpoint,
        }
    }

    pub async fn execute(&self, operation: &Operation) -> Result<OperationResponse, TransportError> {
        let body = serde_json::to_vec(operation)?;
        let mut request = HttpRequest::post(&self.endpoint)
            .with_header("Content-Type", "application/json")
            .with_body(body);

        // The session context is re-read on every call; sign-in and sign-out
        // can happen between two operations.
        if let Some(value) = self.session.auth_header() {
            request = request.with_header("Authorization", value);
        }

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !(200..300).contains(&response.status_code) {
            return Err(TransportError::Status(response.status_code));
        }

        Ok(serde_json::from_slice(&response.body)?)
    }
}
