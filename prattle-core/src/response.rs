use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// A single failure reported by the server inside an otherwise well-formed
/// response. Only the message is load-bearing; `path` is diagnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerError {
    pub message: String,
    pub path: Option<Vec<String>>,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server error: {}", self.message)
    }
}

impl std::error::Error for ServerError {}

/// The uniform result shape for reads, writes, and every pushed event.
#[derive(Debug, Deserialize)]
pub struct OperationResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<ServerError>,
}

impl OperationResponse {
    /// The first reported failure, if the server reported any. When an
    /// operation fails with several errors, the first one becomes the
    /// operation's surfaced failure message.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    /// Extracts the named top-level field from the payload. Returns `None` if
    /// the payload is absent, not an object, or the field is missing or null.
    pub fn take_field(mut self, name: &str) -> Option<Value> {
        let value = self.data.as_mut()?.as_object_mut()?.remove(name)?;
        if value.is_null() { None } else { Some(value) }
    }
}
