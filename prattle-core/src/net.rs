use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;

/// A simple structure to represent an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: String, // "GET" or "POST"
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "POST".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A fully buffered HTTP response, for the request/response lane.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
}

/// A streaming HTTP response, for the push lane. The body is a blocking
/// reader that yields bytes as the server flushes them.
pub struct StreamingHttpResponse {
    pub status_code: u16,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for StreamingHttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingHttpResponse")
            .field("status_code", &self.status_code)
            .field("body", &"<streaming reader>")
            .finish()
    }
}

/// Trait for executing HTTP requests in a runtime-agnostic way.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes a given HTTP request and returns the buffered response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Opens a request whose response body is consumed incrementally. This is
    /// blocking and must be called from a blocking-capable context; the push
    /// lane's read pump runs it inside `spawn_blocking`.
    fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }

    fn execute_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse> {
        (**self).execute_streaming(request)
    }
}
