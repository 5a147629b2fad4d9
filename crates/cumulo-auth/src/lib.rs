//! AWS Signature Version 4 request signing.
//!
//! This crate produces the authentication material for S3-compatible API
//! calls:
//!
//! - [`canonical`]: deterministic canonical-request construction (URI segment
//!   encoding, byte-sorted query strings, normalized headers).
//! - [`sigv4`]: the signing-key HMAC chain, string-to-sign, and the
//!   `Authorization`-header signing flow.
//! - [`presign`]: query-string-signed presigned URLs with expiry clamping.
//! - [`credentials`]: the long-term key pair, with the secret redacted from
//!   all debug output.
//!
//! Everything here is pure computation over a caller-supplied timestamp; the
//! HTTP exchange lives elsewhere.

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod presign;
pub mod sigv4;

pub use credentials::Credentials;
pub use error::SignError;
pub use presign::{MAX_EXPIRES_MINUTES, presign_url};
pub use sigv4::{SignedHeaders, UNSIGNED_PAYLOAD, generate_auth_headers, hash_payload};
