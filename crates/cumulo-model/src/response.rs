//! The uniform response envelope.
//!
//! Every client-facing operation returns exactly one [`S3Response`]: either a
//! success carrying typed data, or an [`ErrorResponse`] carrying an
//! [`ErrorCode`], a message, and (for composite operations) a per-key failure
//! breakdown. Callers branch on [`S3Response::is_successful`] and never on raw
//! HTTP statuses or raw XML.

use http::StatusCode;

use crate::error::ErrorCode;

/// One sub-operation failure inside a composite operation (prefix rename,
/// batch delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// The object key the sub-operation targeted.
    pub key: String,
    /// The failure code of the sub-operation.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

/// A failed operation.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// The HTTP status of the failed exchange, when one completed.
    pub status_code: Option<StatusCode>,
    /// The failure class, or the remote code passed through verbatim.
    pub code: ErrorCode,
    /// Human-readable detail. Remote messages are preserved as received.
    pub message: String,
    /// Per-key breakdown for composite operations; empty otherwise.
    pub failures: Vec<OperationFailure>,
}

impl ErrorResponse {
    /// Create an error response with no HTTP status.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            code,
            message: message.into(),
            failures: Vec::new(),
        }
    }

    /// Attach the HTTP status of the failed exchange.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attach a per-key failure breakdown.
    #[must_use]
    pub fn with_failures(mut self, failures: Vec<OperationFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// A transport-level failure (the request never completed).
    #[must_use]
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    /// A non-2xx response with no parseable S3 `<Error>` body.
    #[must_use]
    pub fn http_error(status: StatusCode) -> Self {
        Self::new(ErrorCode::HttpError, format!("status {}", status.as_u16()))
            .with_status(status)
    }

    /// A malformed response body on an otherwise successful exchange.
    #[must_use]
    pub fn xml_parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::XmlParseError, message)
    }

    /// Bad configuration or arguments, caught before any request is sent.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// An empty body where content was required.
    #[must_use]
    pub fn empty_response() -> Self {
        Self::new(ErrorCode::EmptyResponse, "response body was empty")
    }

    /// An error code and message reported by the remote service.
    #[must_use]
    pub fn remote(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self::new(ErrorCode::Remote(code.into()), message).with_status(status)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The tagged success/error envelope returned by every client operation.
#[derive(Debug, Clone)]
pub enum S3Response<T> {
    /// The operation succeeded. `status_code` is usually 200; composite
    /// operations report 207 on partial success.
    Success {
        /// HTTP status of the (final) exchange.
        status_code: StatusCode,
        /// The typed operation result.
        data: T,
    },
    /// The operation failed.
    Error(ErrorResponse),
}

impl<T> S3Response<T> {
    /// Create a success envelope with status 200.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self::Success {
            status_code: StatusCode::OK,
            data,
        }
    }

    /// Create a success envelope with an explicit status code.
    #[must_use]
    pub fn success(status_code: StatusCode, data: T) -> Self {
        Self::Success { status_code, data }
    }

    /// Whether the operation succeeded (including 207 partial success).
    #[must_use]
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The HTTP status of the exchange, when one completed.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Success { status_code, .. } => Some(*status_code),
            Self::Error(err) => err.status_code,
        }
    }

    /// Borrow the success data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Error(_) => None,
        }
    }

    /// Borrow the error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Success { .. } => None,
            Self::Error(err) => Some(err),
        }
    }

    /// Convert the envelope into a `Result`, discarding the success status.
    pub fn into_result(self) -> Result<T, ErrorResponse> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Error(err) => Err(err),
        }
    }

    /// Map the success data, preserving status and errors.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> S3Response<U> {
        match self {
            Self::Success { status_code, data } => S3Response::Success {
                status_code,
                data: f(data),
            },
            Self::Error(err) => S3Response::Error(err),
        }
    }
}

impl<T> From<ErrorResponse> for S3Response<T> {
    fn from(err: ErrorResponse) -> Self {
        Self::Error(err)
    }
}
