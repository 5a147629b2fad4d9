//! Data model for the Cumulo S3-compatible client.
//!
//! This crate defines the types that flow across the client's call surface:
//!
//! - [`response`]: the tagged success/error envelope every operation returns.
//! - [`error`]: the error-code taxonomy, including verbatim passthrough of
//!   remote S3 error codes.
//! - [`types`]: value objects parsed from S3 responses — buckets, objects,
//!   prefixes (folders), CORS rules, list pages, and batch-delete results.
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod response;
pub mod types;

pub use error::ErrorCode;
pub use response::{ErrorResponse, OperationFailure, S3Response};
pub use types::{
    BatchDeleteFailure, BatchDeleteResult, BucketsList, CopyResult, CorsConfig, CorsRule,
    DeletedObject, KeyPermissions, ObjectCategory, ObjectsList, Owner, RenameOutcome,
    RenamePrefixResult, S3Bucket, S3Object, S3Prefix,
};
