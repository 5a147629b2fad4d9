//! Signing errors.

/// Errors that can occur while producing a signature or presigned URL.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The requested presigned-URL expiry is outside the service limit of
    /// 1 minute to 7 days.
    #[error("presigned URL expiry of {0} minutes is outside the allowed range [1, 10080]")]
    ExpiryOutOfRange(u64),
}
