use log::{debug, warn};
use prattle_core::net::{HttpClient, HttpRequest};
use prattle_core::operation::Operation;
use prattle_core::response::OperationResponse;
use prattle_core::session::SessionContext;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push connection failed: {0}")]
    Connect(String),

    #[error("push endpoint returned status {0}")]
    Status(u16),

    #[error("push stream failed: {0}")]
    Stream(String),

    #[error("malformed push payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One delivery on a push registration: the channel rendition of
/// on-next / on-error / on-complete.
#[derive(Debug)]
pub enum PushEvent {
    /// A server-initiated event, shaped exactly like a read/write result.
    Next(OperationResponse),
    /// A transport-level failure. Reported once; the channel never retries on
    /// its own — reconnection is a caller policy.
    Failed(PushError),
    /// The server closed the stream cleanly.
    Complete,
}

/// A live push registration. Dropping the handle cancels it.
pub struct Subscription {
    rx: Option<mpsc::Receiver<PushEvent>>,
    cancel: Arc<AtomicBool>,
}

impl Subscription {
    /// Waits for the next delivery. Returns `None` once the registration is
    /// unsubscribed or the pump has stopped after `Failed`/`Complete`.
    pub async fn next(&mut self) -> Option<PushEvent> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Cancels this registration. Idempotent and safe at any point, including
    /// before the first event and during an in-flight delivery; once it
    /// returns, no further event can be observed through this handle.
    pub fn unsubscribe(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.rx.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

/// The push lane: wraps the streaming side of the HTTP client into per-
/// operation registrations. One persistent connection per subscription.
pub struct PushChannel {
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
    endpoint: String,
}

impl PushChannel {
    pub fn new(http: Arc<dyn HttpClient>, session: Arc<SessionContext>, endpoint: String) -> Self {
        Self {
            http,
            session,
            endpoint,
        }
    }

    /// Opens a persistent connection for one subscribe operation and returns
    /// the registration handle. Connection establishment happens on the pump
    /// thread; a failure to connect surfaces as the first (and only)
    /// `Failed` event rather than an error here.
    pub fn subscribe(&self, operation: &Operation) -> Subscription {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = Arc::new(AtomicBool::new(false));

        let mut request = HttpRequest::post(&self.endpoint)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "text/event-stream");
        // Same header rule as the request lane: re-read the session context
        // at subscribe time, attach nothing while signed out.
        if let Some(value) = self.session.auth_header() {
            request = request.with_header("Authorization", value);
        }
        match serde_json::to_vec(operation) {
            Ok(body) => request = request.with_body(body),
            Err(e) => {
                // Unreachable for well-formed operations, but keep the
                // contract: every failure arrives through the handle.
                let _ = tx.try_send(PushEvent::Failed(PushError::Malformed(e)));
                return Subscription { rx: Some(rx), cancel };
            }
        }

        let http = self.http.clone();
        let pump_cancel = cancel.clone();
        let name = operation.name.clone();
        tokio::task::spawn_blocking(move || {
            debug!(target: "Client/Push", "Opening push stream for '{name}'");
            run_pump(http, request, pump_cancel, tx);
            debug!(target: "Client/Push", "Push stream for '{name}' stopped");
        });

        Subscription { rx: Some(rx), cancel }
    }
}

/// The blocking read pump: one per registration, runs on a blocking thread
/// until the stream ends, the pump errors out, or the registration is
/// cancelled.
fn run_pump(
    http: Arc<dyn HttpClient>,
    request: HttpRequest,
    cancel: Arc<AtomicBool>,
    tx: mpsc::Sender<PushEvent>,
) {
    let stream = match http.execute_streaming(request) {
        Ok(stream) if (200..300).contains(&stream.status_code) => stream,
        Ok(stream) => {
            let _ = tx.blocking_send(PushEvent::Failed(PushError::Status(stream.status_code)));
            return;
        }
        Err(e) => {
            let _ = tx.blocking_send(PushEvent::Failed(PushError::Connect(e.to_string())));
            return;
        }
    };

    let mut reader = stream.body;
    let mut parser = SseParser::default();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        match reader.read(&mut chunk) {
            Ok(0) => {
                // EOF without a complete record is a dropped connection.
                let _ = tx.blocking_send(PushEvent::Failed(PushError::Stream(
                    "connection closed before completion".to_string(),
                )));
                return;
            }
            Ok(n) => {
                for record in parser.feed(&chunk[..n]) {
                    if cancel.load(Ordering::SeqCst) {
                        return;
                    }
                    match record.event.as_str() {
                        "next" => {
                            let event = match serde_json::from_str(&record.data) {
                                Ok(response) => PushEvent::Next(response),
                                Err(e) => PushEvent::Failed(PushError::Malformed(e)),
                            };
                            let failed = matches!(event, PushEvent::Failed(_));
                            if tx.blocking_send(event).is_err() || failed {
                                return;
                            }
                        }
                        "complete" => {
                            let _ = tx.blocking_send(PushEvent::Complete);
                            return;
                        }
                        other => {
                            warn!(target: "Client/Push", "Ignoring unknown push record '{other}'");
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(PushEvent::Failed(PushError::Stream(e.to_string())));
                return;
            }
        }
    }
}

struct SseRecord {
    event: String,
    data: String,
}

/// Incremental parser for the wire framing of the push stream: records are
/// `event:`/`data:` line groups terminated by a blank line, possibly split
/// arbitrarily across reads. The buffer stays in bytes until a full block is
/// present: reads can end mid-character, and the block delimiter is ASCII, so
/// only complete blocks are safe to decode.
#[derive(Default)]
struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    fn feed(&mut self, bytes: &[u8]) -> Vec<SseRecord> {
        self.buffer.extend_from_slice(bytes);
        let mut records = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
            self.buffer.drain(..end + 2);
            if let Some(record) = parse_block(&block) {
                records.push(record);
            }
        }
        records
    }
}

fn parse_block(block: &str) -> Option<SseRecord> {
    let mut event = String::new();
    let mut data_lines: Vec<&str> = Vec::new();
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim_start().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // Comment lines (leading ':') and unknown fields are ignored.
    }
    if event.is_empty() && data_lines.is_empty() {
        return None;
    }
    Some(SseRecord {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttpClient;
    use prattle_core::types::AuthUser;

    fn channel(http: Arc<MockHttpClient>, session: Arc<SessionContext>) -> PushChannel {
        PushChannel::new(http, session, "http://test/graphql".to_string())
    }

    fn sse(records: &[(&str, &str)]) -> Vec<u8> {
        let mut out = String::new();
        for (event, data) in records {
            out.push_str(&format!("event: {event}\ndata: {data}\n\n"));
        }
        out.into_bytes()
    }

    #[test]
    fn parser_keeps_multibyte_content_intact_across_chunks() {
        let record =
            "event: next\ndata: {\"data\": {\"messageAdded\": {\"content\": \"こんにちは\"}}}\n\n";
        let bytes = record.as_bytes();
        // Split one byte into the first three-byte character.
        let split = record.find('こ').unwrap() + 1;

        let mut parser = SseParser::default();
        assert!(parser.feed(&bytes[..split]).is_empty());
        let records = parser.feed(&bytes[split..]);

        assert_eq!(records.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&records[0].data).unwrap();
        assert_eq!(payload["data"]["messageAdded"]["content"], "こんにちは");
    }

    #[test]
    fn parser_handles_records_split_across_reads() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"event: next\nda").is_empty());
        let records = parser.feed(b"ta: {\"data\":null}\n\nevent: complete\ndata:\n\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, "next");
        assert_eq!(records[0].data, "{\"data\":null}");
        assert_eq!(records[1].event, "complete");
    }

    #[tokio::test]
    async fn delivers_next_records_then_complete() {
        let http = MockHttpClient::new();
        http.queue_stream(sse(&[
            ("next", r#"{"data": {"messageAdded": null}}"#),
            ("next", r#"{"data": null, "errors": [{"message": "user not found"}]}"#),
            ("complete", ""),
        ]));
        let mut sub = channel(http, Arc::new(SessionContext::new()))
            .subscribe(&Operation::subscribe("messageAdded"));

        assert!(matches!(sub.next().await, Some(PushEvent::Next(r)) if r.first_error().is_none()));
        assert!(matches!(
            sub.next().await,
            Some(PushEvent::Next(r)) if r.first_error() == Some("user not found")
        ));
        assert!(matches!(sub.next().await, Some(PushEvent::Complete)));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn connection_drop_surfaces_as_single_failure() {
        let http = MockHttpClient::new();
        // One record, then EOF without a complete.
        http.queue_stream(sse(&[("next", r#"{"data": null}"#)]));
        let mut sub = channel(http, Arc::new(SessionContext::new()))
            .subscribe(&Operation::subscribe("messageAdded"));

        assert!(matches!(sub.next().await, Some(PushEvent::Next(_))));
        assert!(matches!(
            sub.next().await,
            Some(PushEvent::Failed(PushError::Stream(_)))
        ));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn connect_failure_arrives_through_the_handle() {
        let http = MockHttpClient::new(); // no scripted stream
        let mut sub = channel(http, Arc::new(SessionContext::new()))
            .subscribe(&Operation::subscribe("messageAdded"));

        assert!(matches!(
            sub.next().await,
            Some(PushEvent::Failed(PushError::Connect(_)))
        ));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_final() {
        let http = MockHttpClient::new();
        http.queue_stream(sse(&[
            ("next", r#"{"data": null}"#),
            ("complete", ""),
        ]));
        let mut sub = channel(http, Arc::new(SessionContext::new()))
            .subscribe(&Operation::subscribe("messageAdded"));

        // Before any event has been observed, and again after: no panic, and
        // nothing is ever delivered through the handle.
        sub.unsubscribe();
        assert!(sub.next().await.is_none());
        sub.unsubscribe();
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn subscribe_attaches_bearer_header_when_signed_in() {
        let http = MockHttpClient::new();
        http.queue_stream(sse(&[("complete", "")]));
        let session = Arc::new(SessionContext::new());
        session.set(AuthUser {
            id: "u9".to_string(),
            nickname: "carol".to_string(),
        });

        let mut sub = channel(http.clone(), session)
            .subscribe(&Operation::subscribe("messageAdded"));
        assert!(matches!(sub.next().await, Some(PushEvent::Complete)));

        let request = http.last_request().unwrap();
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer u9")
        );
        assert_eq!(
            request.headers.get("Accept").map(String::as_str),
            Some("text/event-stream")
        );
    }
}
