//! The HTTP transport seam.
//!
//! The signer never talks to the network directly; it hands a fully built
//! [`HttpRequest`] to a [`Transport`]. The production implementation wraps
//! `reqwest`; tests script exchanges through [`MockTransport`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};

/// The class of operation a request performs. Determines the timeout and
/// whether a transport failure may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Object metadata probe.
    Head,
    /// Single-object or configuration delete.
    Delete,
    /// Object or configuration fetch.
    Get,
    /// Small PUT (configuration, copy trigger).
    Put,
    /// Bucket or object listing.
    List,
    /// Server-side object copy.
    Copy,
    /// Multi-object batch operation.
    Batch,
    /// Object upload carrying a payload.
    Upload,
}

impl OperationKind {
    /// Per-operation request timeout.
    #[must_use]
    pub fn timeout(self) -> Duration {
        match self {
            Self::Head | Self::Delete => Duration::from_secs(15),
            Self::Get | Self::Put | Self::List | Self::Copy => Duration::from_secs(30),
            Self::Batch => Duration::from_secs(60),
            Self::Upload => Duration::from_secs(120),
        }
    }

    /// Whether a transport failure may be retried without risking a
    /// duplicated side effect. Mutating operations are never retried.
    #[must_use]
    pub fn is_idempotent(self) -> bool {
        matches!(self, Self::Head | Self::Get | Self::List)
    }
}

/// A fully built outbound request: the signer has already attached all
/// authentication headers, and `url` matches the signed canonical form
/// byte-for-byte.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    /// Headers to send verbatim.
    pub headers: Vec<(String, String)>,
    /// Request body; empty for most operations.
    pub body: Bytes,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// A completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Full response body.
    pub body: Bytes,
}

/// A transport-level failure: the exchange never completed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS, or protocol failure.
    #[error("transport failure: {0}")]
    Connect(String),
}

/// Sends one HTTP request and returns the full response.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform the exchange.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// The production transport, backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh connection pool.
    ///
    /// Timeouts are applied per request from [`HttpRequest::timeout`], not on
    /// the client.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                TransportError::Connect(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

/// A scripted transport for tests: responses are served in push order, and
/// every request is recorded for later inspection.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create an empty scripted transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<Bytes>) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Ok(HttpResponse {
                status,
                body: body.into(),
            }));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Err(error));
    }

    /// All requests sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("mock lock").clone()
    }

    /// The number of requests sent so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("mock lock").len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().expect("mock lock").push(request);
        self.responses
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no scripted response".to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_use_per_operation_timeouts() {
        assert_eq!(OperationKind::Head.timeout(), Duration::from_secs(15));
        assert_eq!(OperationKind::Delete.timeout(), Duration::from_secs(15));
        assert_eq!(OperationKind::Get.timeout(), Duration::from_secs(30));
        assert_eq!(OperationKind::List.timeout(), Duration::from_secs(30));
        assert_eq!(OperationKind::Batch.timeout(), Duration::from_secs(60));
        assert_eq!(OperationKind::Upload.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_should_mark_only_reads_idempotent() {
        assert!(OperationKind::Get.is_idempotent());
        assert!(OperationKind::Head.is_idempotent());
        assert!(OperationKind::List.is_idempotent());
        assert!(!OperationKind::Put.is_idempotent());
        assert!(!OperationKind::Delete.is_idempotent());
        assert!(!OperationKind::Batch.is_idempotent());
        assert!(!OperationKind::Upload.is_idempotent());
    }

    #[tokio::test]
    async fn test_should_serve_scripted_responses_in_order() {
        let mock = MockTransport::new();
        mock.push_response(200, "first");
        mock.push_response(404, "second");

        let request = HttpRequest {
            method: Method::GET,
            url: "https://example.com/".to_owned(),
            headers: vec![],
            body: Bytes::new(),
            timeout: Duration::from_secs(1),
        };

        let first = mock.send(request.clone()).await.expect("first");
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body.as_ref(), b"first");

        let second = mock.send(request.clone()).await.expect("second");
        assert_eq!(second.status, StatusCode::NOT_FOUND);

        // Exhausted scripts surface as transport failures.
        assert!(mock.send(request).await.is_err());
        assert_eq!(mock.request_count(), 3);
    }
}
