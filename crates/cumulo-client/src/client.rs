//! Client orchestration: caching, composite operations, and the call surface
//! UI layers consume.
//!
//! [`S3Client`] composes a [`Signer`], a [`Cache`], and a [`ClientConfig`].
//! Read operations consult the cache first; every mutation invalidates the
//! listings it could have staled, scoped by bucket and prefix. Composite
//! operations (rename, prefix rename, batch delete) report partial success as
//! a 207 envelope with a per-key failure breakdown, never a silent drop.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use rand::Rng;
use tracing::{debug, info, warn};

use cumulo_model::types::parent_prefix_of;
use cumulo_model::{
    BatchDeleteResult, BucketsList, CopyResult, CorsConfig, ErrorCode, ErrorResponse,
    KeyPermissions, ObjectsList, OperationFailure, RenameOutcome, RenamePrefixResult, S3Prefix,
    S3Response,
};

use crate::cache::{Cache, MemoryCache};
use crate::paginate::ObjectsPager;
use crate::signer::{ListObjectsQuery, Signer};

/// The batch-delete request limit imposed by the protocol.
const BATCH_DELETE_LIMIT: usize = 1000;

/// Tunables for caching and CORS propagation polling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TTL for cached list responses.
    pub cache_ttl: Duration,
    /// How many times to poll for CORS propagation after a change.
    pub cors_poll_attempts: u32,
    /// Delay before the first CORS poll; doubles per attempt.
    pub cors_poll_base_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cors_poll_attempts: 5,
            cors_poll_base_delay: Duration::from_millis(200),
        }
    }
}

/// The provider-abstracted S3 client.
#[derive(Debug)]
pub struct S3Client {
    signer: Signer,
    cache: Arc<dyn Cache>,
    config: ClientConfig,
}

impl S3Client {
    /// Create a client with an in-memory cache and default configuration.
    #[must_use]
    pub fn new(signer: Signer) -> Self {
        Self {
            signer,
            cache: Arc::new(MemoryCache::new()),
            config: ClientConfig::default(),
        }
    }

    /// Swap in a different cache backend.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    /// Override the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// The provider this client addresses.
    #[must_use]
    pub fn provider(&self) -> &crate::provider::Provider {
        self.signer.provider()
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// List buckets, serving from cache when `use_cache` is set.
    pub async fn get_buckets(
        &self,
        max_keys: Option<u32>,
        prefix: Option<&str>,
        marker: Option<&str>,
        use_cache: bool,
    ) -> S3Response<BucketsList> {
        let cache_key = buckets_cache_key(max_keys, prefix, marker);
        if use_cache {
            if let Some(list) = self.cache_fetch::<BucketsList>(&cache_key) {
                return S3Response::ok(list);
            }
        }

        let response = self.signer.list_buckets(max_keys, prefix, marker).await;
        if let Some(list) = response.data() {
            self.cache_store(&cache_key, list);
        }
        response
    }

    /// List one page of objects, serving from cache when `use_cache` is set.
    pub async fn get_objects(
        &self,
        bucket: &str,
        query: &ListObjectsQuery,
        use_cache: bool,
    ) -> S3Response<ObjectsList> {
        let cache_key = objects_cache_key(bucket, query);
        if use_cache {
            if let Some(list) = self.cache_fetch::<ObjectsList>(&cache_key) {
                debug!(bucket, cache_key, "object listing served from cache");
                return S3Response::ok(list);
            }
        }

        let response = self.signer.list_objects(bucket, query).await;
        if let Some(list) = response.data() {
            self.cache_store(&cache_key, list);
        }
        response
    }

    /// Walk every page of a listing lazily. Each call starts a fresh walk.
    #[must_use]
    pub fn objects_pager(
        &self,
        bucket: &str,
        query: ListObjectsQuery,
        use_cache: bool,
    ) -> ObjectsPager<'_> {
        ObjectsPager::new(self, bucket, query, use_cache)
    }

    // -----------------------------------------------------------------------
    // Single-object operations
    // -----------------------------------------------------------------------

    /// Fetch an object's raw bytes. Never cached.
    pub async fn get_object(&self, bucket: &str, key: &str) -> S3Response<Bytes> {
        self.signer.get_object(bucket, key).await
    }

    /// Upload an object and invalidate the listings it appears in.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> S3Response<()> {
        let response = self.signer.put_object(bucket, key, body, content_type).await;
        if response.is_successful() {
            self.invalidate_key_listings(bucket, key);
        }
        response
    }

    /// Delete an object and invalidate its parent-prefix listings.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> S3Response<()> {
        let response = self.signer.delete_object(bucket, key).await;
        if response.is_successful() {
            self.invalidate_key_listings(bucket, key);
        }
        response
    }

    /// Server-side copy; invalidates the target's parent-prefix listings.
    pub async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> S3Response<CopyResult> {
        let response = self
            .signer
            .copy_object(source_bucket, source_key, target_bucket, target_key)
            .await;
        if response.is_successful() {
            self.invalidate_key_listings(target_bucket, target_key);
        }
        response
    }

    /// Rename an object: copy to the target key, then delete the original.
    ///
    /// The copy always happens first, so the object is never left existing at
    /// neither key. A copy failure aborts before any delete and reports
    /// `rename_error` with the sub-failure attached. A delete failure after a
    /// successful copy reports 207: the object exists at both keys.
    pub async fn rename_object(
        &self,
        bucket: &str,
        source_key: &str,
        target_key: &str,
    ) -> S3Response<RenameOutcome> {
        debug!(bucket, source_key, target_key, "renaming object");

        if let S3Response::Error(err) = self
            .signer
            .copy_object(bucket, source_key, bucket, target_key)
            .await
        {
            let mut wrapped = ErrorResponse::new(
                ErrorCode::RenameError,
                format!("copy of '{source_key}' to '{target_key}' failed: {}", err.message),
            )
            .with_failures(vec![OperationFailure {
                key: source_key.to_owned(),
                code: err.code,
                message: err.message,
            }]);
            wrapped.status_code = err.status_code;
            return wrapped.into();
        }
        self.invalidate_key_listings(bucket, target_key);

        match self.signer.delete_object(bucket, source_key).await {
            S3Response::Success { .. } => {
                self.invalidate_key_listings(bucket, source_key);
                S3Response::ok(RenameOutcome {
                    source_key: source_key.to_owned(),
                    target_key: target_key.to_owned(),
                    copied: true,
                    original_removed: true,
                })
            }
            S3Response::Error(err) => {
                warn!(
                    bucket,
                    source_key,
                    error = %err,
                    "copied but could not remove original"
                );
                S3Response::success(
                    StatusCode::MULTI_STATUS,
                    RenameOutcome {
                        source_key: source_key.to_owned(),
                        target_key: target_key.to_owned(),
                        copied: true,
                        original_removed: false,
                    },
                )
            }
        }
    }

    /// Rename every object under a prefix, strictly copy-then-delete per key.
    ///
    /// With `recursive` unset, only objects directly under the prefix are
    /// renamed. Returns full success, 207 with a `failures` breakdown on
    /// partial success, or `rename_error` when nothing was renamed.
    pub async fn rename_prefix(
        &self,
        bucket: &str,
        source_prefix: &str,
        target_prefix: &str,
        recursive: bool,
    ) -> S3Response<RenamePrefixResult> {
        let source_prefix = S3Prefix::new(source_prefix).prefix;
        let target_prefix = S3Prefix::new(target_prefix).prefix;
        info!(bucket, %source_prefix, %target_prefix, recursive, "renaming prefix");

        let query = ListObjectsQuery {
            prefix: Some(source_prefix.clone()),
            delimiter: (!recursive).then(|| "/".to_owned()),
            ..ListObjectsQuery::default()
        };
        let objects = match self.objects_pager(bucket, query, false).collect_objects().await {
            Ok(objects) => objects,
            Err(err) => {
                return ErrorResponse::new(
                    ErrorCode::RenameError,
                    format!("could not list '{source_prefix}': {}", err.message),
                )
                .into();
            }
        };

        let mut result = RenamePrefixResult::default();
        for object in &objects {
            let Some(relative) = object.key.strip_prefix(&source_prefix) else {
                continue;
            };
            let target_key = format!("{target_prefix}{relative}");

            match self.rename_object(bucket, &object.key, &target_key).await {
                S3Response::Success { status_code, .. } if status_code == StatusCode::OK => {
                    result.renamed.push(object.key.clone());
                }
                S3Response::Success { .. } => result.failures.push(OperationFailure {
                    key: object.key.clone(),
                    code: ErrorCode::RenameError,
                    message: "copied but original was not removed".to_owned(),
                }),
                S3Response::Error(err) => result.failures.push(OperationFailure {
                    key: object.key.clone(),
                    code: err.code,
                    message: err.message,
                }),
            }
        }

        self.invalidate_prefix_listings(bucket, &source_prefix);
        self.invalidate_prefix_listings(bucket, &target_prefix);

        if result.failures.is_empty() {
            S3Response::ok(result)
        } else if result.renamed.is_empty() {
            ErrorResponse::new(
                ErrorCode::RenameError,
                format!("no object under '{source_prefix}' could be renamed"),
            )
            .with_failures(result.failures)
            .into()
        } else {
            S3Response::success(StatusCode::MULTI_STATUS, result)
        }
    }

    // -----------------------------------------------------------------------
    // Batch deletes
    // -----------------------------------------------------------------------

    /// Delete many keys, chunked to the protocol limit of 1000 per request.
    ///
    /// Per-key failures reported by the service produce a 207 envelope with
    /// the merged [`BatchDeleteResult`]; a failed chunk request aborts with
    /// `batch_delete_error` carrying the keys of that chunk.
    pub async fn delete_objects(&self, bucket: &str, keys: &[String]) -> S3Response<BatchDeleteResult> {
        let mut merged = BatchDeleteResult::default();

        for chunk in keys.chunks(BATCH_DELETE_LIMIT) {
            match self.signer.delete_objects(bucket, chunk).await {
                S3Response::Success { data, .. } => merged.merge(data),
                S3Response::Error(err) => {
                    let failures = chunk
                        .iter()
                        .map(|key| OperationFailure {
                            key: key.clone(),
                            code: err.code.clone(),
                            message: err.message.clone(),
                        })
                        .collect();
                    return ErrorResponse::new(
                        ErrorCode::BatchDeleteError,
                        format!("batch delete request failed: {}", err.message),
                    )
                    .with_failures(failures)
                    .into();
                }
            }
        }

        for key in keys {
            self.invalidate_key_listings(bucket, key);
        }

        if merged.is_complete() {
            S3Response::ok(merged)
        } else {
            S3Response::success(StatusCode::MULTI_STATUS, merged)
        }
    }

    /// Delete every object under a prefix (recursive).
    pub async fn delete_prefix(&self, bucket: &str, prefix: &str) -> S3Response<BatchDeleteResult> {
        let prefix = S3Prefix::new(prefix).prefix;
        let query = ListObjectsQuery {
            prefix: Some(prefix.clone()),
            ..ListObjectsQuery::default()
        };
        let objects = match self.objects_pager(bucket, query, false).collect_objects().await {
            Ok(objects) => objects,
            Err(err) => {
                return ErrorResponse::new(
                    ErrorCode::BatchDeleteError,
                    format!("could not list '{prefix}': {}", err.message),
                )
                .into();
            }
        };

        let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
        if keys.is_empty() {
            return S3Response::ok(BatchDeleteResult::default());
        }
        info!(bucket, %prefix, count = keys.len(), "deleting prefix");
        self.delete_objects(bucket, &keys).await
    }

    // -----------------------------------------------------------------------
    // CORS
    // -----------------------------------------------------------------------

    /// Fetch a bucket's CORS configuration.
    pub async fn get_cors(&self, bucket: &str) -> S3Response<CorsConfig> {
        self.signer.get_bucket_cors(bucket).await
    }

    /// Replace a bucket's CORS configuration, then poll with backoff until
    /// the change is visible. The returned flag reports whether propagation
    /// was confirmed within the polling budget; the write itself succeeded
    /// either way.
    pub async fn set_cors(&self, bucket: &str, config: &CorsConfig) -> S3Response<bool> {
        if let S3Response::Error(err) = self.signer.put_bucket_cors(bucket, config).await {
            return err.into();
        }

        for attempt in 0..self.config.cors_poll_attempts {
            let delay = self.config.cors_poll_base_delay * 2u32.saturating_pow(attempt);
            tokio::time::sleep(delay).await;

            if let S3Response::Success { data, .. } = self.signer.get_bucket_cors(bucket).await {
                if data == *config {
                    debug!(bucket, attempt, "CORS change confirmed");
                    return S3Response::ok(true);
                }
            }
        }

        warn!(bucket, "CORS change not confirmed within polling budget");
        S3Response::ok(false)
    }

    /// Remove a bucket's CORS configuration.
    pub async fn delete_cors(&self, bucket: &str) -> S3Response<()> {
        self.signer.delete_bucket_cors(bucket).await
    }

    /// Whether browser uploads from `origin` would be permitted by the
    /// bucket's CORS rules. A bucket with no configuration reports `false`.
    pub async fn cors_allows_upload(&self, bucket: &str, origin: &str) -> S3Response<bool> {
        match self.signer.get_bucket_cors(bucket).await {
            S3Response::Success { status_code, data } => {
                S3Response::success(status_code, data.allows_upload(origin))
            }
            S3Response::Error(err) if err.code.as_str() == "NoSuchCORSConfiguration" => {
                S3Response::ok(false)
            }
            S3Response::Error(err) => err.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Presigned URLs
    // -----------------------------------------------------------------------

    /// A time-limited download URL.
    pub fn get_presigned_url(&self, bucket: &str, key: &str, expires_minutes: u64) -> S3Response<String> {
        self.signer.presigned_url(bucket, key, &Method::GET, expires_minutes)
    }

    /// A time-limited upload URL. The eventual upload stales listings, so the
    /// key's parent-prefix cache entries are invalidated up front.
    pub fn get_presigned_upload_url(
        &self,
        bucket: &str,
        key: &str,
        expires_minutes: u64,
    ) -> S3Response<String> {
        let response = self.signer.presigned_url(bucket, key, &Method::PUT, expires_minutes);
        if response.is_successful() {
            self.invalidate_key_listings(bucket, key);
        }
        response
    }

    // -----------------------------------------------------------------------
    // Permission probe
    // -----------------------------------------------------------------------

    /// Probe what the configured credentials can do against `bucket`: list,
    /// then a throwaway PUT and DELETE of a random-named object. Never fails;
    /// each incapability becomes a `false` flag plus an `errors` entry.
    pub async fn check_key_permissions(&self, bucket: &str) -> S3Response<KeyPermissions> {
        let mut permissions = KeyPermissions::default();

        let list_query = ListObjectsQuery {
            max_keys: Some(1),
            ..ListObjectsQuery::default()
        };
        match self.signer.list_objects(bucket, &list_query).await {
            S3Response::Success { .. } => permissions.read = true,
            S3Response::Error(err) => {
                permissions
                    .errors
                    .insert("read".to_owned(), format!("{}: {}", err.code, err.message));
            }
        }

        let probe_key = format!("cumulo-probe-{:016x}", rand::thread_rng().r#gen::<u64>());
        match self
            .signer
            .put_object(bucket, &probe_key, Bytes::from_static(b"permission probe"), Some("text/plain"))
            .await
        {
            S3Response::Success { .. } => {
                permissions.write = true;
                match self.signer.delete_object(bucket, &probe_key).await {
                    S3Response::Success { .. } => permissions.delete = true,
                    S3Response::Error(err) => {
                        warn!(bucket, probe_key, "probe object could not be removed");
                        permissions
                            .errors
                            .insert("delete".to_owned(), format!("{}: {}", err.code, err.message));
                    }
                }
            }
            S3Response::Error(err) => {
                permissions
                    .errors
                    .insert("write".to_owned(), format!("{}: {}", err.code, err.message));
                permissions
                    .errors
                    .insert("delete".to_owned(), "skipped: write probe failed".to_owned());
            }
        }

        self.invalidate_key_listings(bucket, &probe_key);
        S3Response::ok(permissions)
    }

    // -----------------------------------------------------------------------
    // Cache plumbing
    // -----------------------------------------------------------------------

    /// Drop every cached listing.
    pub fn cache_clear(&self) {
        self.cache.flush_all();
    }

    fn cache_fetch<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key)?;
        serde_json::from_slice(&bytes).ok()
    }

    fn cache_store<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.cache.set(key, bytes, self.config.cache_ttl);
        }
    }

    /// Flush the listings a change to `key` could have staled: everything at
    /// or under its parent prefix, plus the bucket-root listing.
    ///
    /// The flush prefix drops the trailing slash so listings cached under a
    /// non-normalized query prefix (`photos` rather than `photos/`) are
    /// invalidated too.
    fn invalidate_key_listings(&self, bucket: &str, key: &str) {
        let parent = parent_prefix_of(key);
        self.cache
            .flush_prefix(&format!("objects:{bucket}:{}", parent.trim_end_matches('/')));
        self.cache.flush_prefix(&format!("objects:{bucket}::"));
    }

    /// Flush the listings a prefix-level change could have staled: the
    /// prefix's own subtree, its parent's listing (slashed and unslashed
    /// query forms), and the bucket root.
    fn invalidate_prefix_listings(&self, bucket: &str, prefix: &str) {
        self.cache
            .flush_prefix(&format!("objects:{bucket}:{}", prefix.trim_end_matches('/')));
        let parent = S3Prefix::new(prefix).parent_prefix();
        self.cache.flush_prefix(&format!("objects:{bucket}:{parent}:"));
        self.cache
            .flush_prefix(&format!("objects:{bucket}:{}:", parent.trim_end_matches('/')));
        self.cache.flush_prefix(&format!("objects:{bucket}::"));
    }
}

fn buckets_cache_key(max_keys: Option<u32>, prefix: Option<&str>, marker: Option<&str>) -> String {
    format!(
        "buckets:{}:{}:{}",
        max_keys.map_or_else(|| "-".to_owned(), |n| n.to_string()),
        prefix.unwrap_or("-"),
        marker.unwrap_or("-"),
    )
}

fn objects_cache_key(bucket: &str, query: &ListObjectsQuery) -> String {
    format!(
        "objects:{bucket}:{}:{}:{}:{}",
        query.prefix.as_deref().unwrap_or(""),
        query.delimiter.as_deref().unwrap_or("-"),
        query.max_keys.map_or_else(|| "-".to_owned(), |n| n.to_string()),
        query.continuation_token.as_deref().unwrap_or("-"),
    )
}
