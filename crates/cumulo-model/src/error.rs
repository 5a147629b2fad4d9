//! Error-code taxonomy for client-facing failures.
//!
//! Local failure classes (transport, parsing, bad arguments, composite
//! operations) get fixed codes; errors reported by the remote service are
//! passed through verbatim via [`ErrorCode::Remote`] so callers and retry
//! logic can branch on the exact S3 code (`NoSuchBucket`, `AccessDenied`,
//! `SignatureDoesNotMatch`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The code attached to every [`ErrorResponse`](crate::response::ErrorResponse).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Bad configuration or arguments, detected before any request is sent
    /// (unknown region, missing account id, out-of-range expiry, ...).
    InvalidArgument,
    /// The HTTP request could not be completed (DNS, TLS, timeout, ...).
    NetworkError,
    /// A non-2xx status whose body carried no parseable S3 `<Error>` XML.
    HttpError,
    /// A 2xx response whose body was not the XML the operation expects.
    XmlParseError,
    /// A 2xx response with an empty body where one was required.
    EmptyResponse,
    /// A composite rename failed; details are in the failure list.
    RenameError,
    /// A batch delete failed entirely; per-key details are in the failure list.
    BatchDeleteError,
    /// An error code reported by the remote service, passed through verbatim.
    Remote(String),
}

impl ErrorCode {
    /// Returns the error code as a string.
    ///
    /// Local codes use `snake_case`; remote codes keep the exact spelling the
    /// service returned.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NetworkError => "network_error",
            Self::HttpError => "http_error",
            Self::XmlParseError => "xml_parse_error",
            Self::EmptyResponse => "empty_response",
            Self::RenameError => "rename_error",
            Self::BatchDeleteError => "batch_delete_error",
            Self::Remote(code) => code,
        }
    }

    /// Whether this code was reported by the remote service.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Create a passthrough code from a remote S3 `<Error><Code>` value.
    #[must_use]
    pub fn remote(code: impl Into<String>) -> Self {
        Self::Remote(code.into())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_local_codes_as_snake_case() {
        assert_eq!(ErrorCode::InvalidArgument.as_str(), "invalid_argument");
        assert_eq!(ErrorCode::NetworkError.as_str(), "network_error");
        assert_eq!(ErrorCode::XmlParseError.as_str(), "xml_parse_error");
    }

    #[test]
    fn test_should_pass_remote_codes_through_verbatim() {
        let code = ErrorCode::remote("NoSuchBucket");
        assert_eq!(code.as_str(), "NoSuchBucket");
        assert!(code.is_remote());
        assert!(!ErrorCode::HttpError.is_remote());
    }
}
