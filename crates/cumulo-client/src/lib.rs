//! Provider-abstracted S3 client.
//!
//! The crate composes four layers:
//!
//! - [`provider`]: per-backend addressing rules — endpoint templates,
//!   path-style vs virtual-hosted-style URLs, custom domains, public URLs.
//! - [`transport`]: the HTTP seam, with a `reqwest`-backed production
//!   implementation and a scripted mock for tests.
//! - [`signer`]: one SigV4-signed wire request per S3 operation, mapped into
//!   the uniform response envelope from `cumulo-model`.
//! - [`client`]: orchestration — listing caches with mutation invalidation,
//!   composite rename and batch-delete operations, CORS management with
//!   propagation polling, presigned URLs, and the credential capability probe.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cumulo_auth::Credentials;
//! use cumulo_client::{ListObjectsQuery, Provider, ReqwestTransport, S3Client, Signer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::aws("us-east-1").map_err(|e| e.message.clone())?;
//! let credentials = Credentials::new("AKID", "secret");
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let client = S3Client::new(Signer::new(provider, credentials, transport));
//!
//! let query = ListObjectsQuery {
//!     prefix: Some("photos/".to_owned()),
//!     delimiter: Some("/".to_owned()),
//!     ..ListObjectsQuery::default()
//! };
//! let page = client.get_objects("media", &query, true).await;
//! if let Some(list) = page.data() {
//!     for object in &list.objects {
//!         println!("{} ({} bytes)", object.key, object.size_bytes);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod paginate;
pub mod provider;
pub mod signer;
pub mod transport;

pub use cache::{Cache, MemoryCache};
pub use client::{ClientConfig, S3Client};
pub use paginate::{ListEntry, ObjectsPager};
pub use provider::{ParsedUrl, Provider, encode_key};
pub use signer::{ListObjectsQuery, RetryPolicy, Signer};
pub use transport::{
    HttpRequest, HttpResponse, MockTransport, OperationKind, ReqwestTransport, Transport,
    TransportError,
};
