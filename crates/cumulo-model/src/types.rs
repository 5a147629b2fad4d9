//! Value objects parsed from S3 responses.
//!
//! All types here are plain data: they are produced by the XML codec,
//! optionally cached (hence the serde derives on the cacheable list shapes),
//! and consumed by UI layers. Derived attributes (filename, media category,
//! folder name) are computed, never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::OperationFailure;

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// The owner of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Owner {
    /// Canonical owner ID.
    pub id: Option<String>,
    /// Display name, when the provider reports one.
    pub display_name: Option<String>,
}

/// One bucket from a `ListBuckets` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation timestamp, when the provider reports one.
    pub creation_date: Option<DateTime<Utc>>,
    /// Bucket region, when known.
    pub region: Option<String>,
}

impl S3Bucket {
    /// Create a bucket record with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
            region: None,
        }
    }
}

/// A parsed `ListBuckets` page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketsList {
    /// Buckets on this page.
    pub buckets: Vec<S3Bucket>,
    /// The account that owns the listing.
    pub owner: Option<Owner>,
    /// Whether more buckets exist beyond this page.
    pub truncated: bool,
    /// Opaque cursor for the next page, when truncated.
    pub next_marker: Option<String>,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Broad media category derived from an object's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    /// Raster or vector image.
    Image,
    /// Video container.
    Video,
    /// Audio container.
    Audio,
    /// Compressed archive.
    Archive,
    /// Text or office document.
    Document,
    /// Anything else.
    Other,
}

impl ObjectCategory {
    /// Returns the category as a lowercase string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

/// One object from a `ListObjectsV2` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Object {
    /// Full object key.
    pub key: String,
    /// Last-modified timestamp.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag with surrounding quotes stripped. For multipart uploads this is a
    /// composite hash-of-part-hashes, not a content hash; see
    /// [`S3Object::has_multipart_etag`].
    pub etag: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Storage class, when reported.
    pub storage_class: Option<String>,
}

impl S3Object {
    /// The last path segment of the key.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// The filename extension, lowercased, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.filename();
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// MIME type guessed from the filename extension.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.extension()
            .and_then(|ext| lookup_extension(&ext))
            .map_or("application/octet-stream", |entry| entry.0)
    }

    /// Media category derived from the filename extension.
    #[must_use]
    pub fn category(&self) -> ObjectCategory {
        self.extension()
            .and_then(|ext| lookup_extension(&ext))
            .map_or(ObjectCategory::Other, |entry| entry.1)
    }

    /// Whether the ETag is a composite multipart ETag (`<hash>-<parts>`).
    ///
    /// Composite ETags cannot be verified against object content; treat them
    /// as opaque metadata.
    #[must_use]
    pub fn has_multipart_etag(&self) -> bool {
        self.etag.contains('-')
    }
}

/// Extension table: (mime type, category).
fn lookup_extension(ext: &str) -> Option<(&'static str, ObjectCategory)> {
    use ObjectCategory::{Archive, Audio, Document, Image, Video};
    let entry = match ext {
        "jpg" | "jpeg" => ("image/jpeg", Image),
        "png" => ("image/png", Image),
        "gif" => ("image/gif", Image),
        "webp" => ("image/webp", Image),
        "svg" => ("image/svg+xml", Image),
        "bmp" => ("image/bmp", Image),
        "ico" => ("image/x-icon", Image),
        "tif" | "tiff" => ("image/tiff", Image),
        "avif" => ("image/avif", Image),
        "heic" => ("image/heic", Image),
        "mp4" => ("video/mp4", Video),
        "mov" => ("video/quicktime", Video),
        "webm" => ("video/webm", Video),
        "mkv" => ("video/x-matroska", Video),
        "avi" => ("video/x-msvideo", Video),
        "m4v" => ("video/x-m4v", Video),
        "mp3" => ("audio/mpeg", Audio),
        "wav" => ("audio/wav", Audio),
        "ogg" => ("audio/ogg", Audio),
        "flac" => ("audio/flac", Audio),
        "m4a" => ("audio/mp4", Audio),
        "aac" => ("audio/aac", Audio),
        "zip" => ("application/zip", Archive),
        "gz" => ("application/gzip", Archive),
        "tar" => ("application/x-tar", Archive),
        "rar" => ("application/vnd.rar", Archive),
        "7z" => ("application/x-7z-compressed", Archive),
        "bz2" => ("application/x-bzip2", Archive),
        "pdf" => ("application/pdf", Document),
        "txt" => ("text/plain", Document),
        "md" => ("text/markdown", Document),
        "csv" => ("text/csv", Document),
        "json" => ("application/json", Document),
        "xml" => ("application/xml", Document),
        "html" | "htm" => ("text/html", Document),
        "doc" => ("application/msword", Document),
        "docx" => (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Document,
        ),
        "xls" => ("application/vnd.ms-excel", Document),
        "xlsx" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Document,
        ),
        "ppt" => ("application/vnd.ms-powerpoint", Document),
        "pptx" => (
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Document,
        ),
        _ => return None,
    };
    Some(entry)
}

/// A common prefix (folder) from a delimited listing.
///
/// The prefix is always stored with a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Prefix {
    /// The prefix, trailing-slash-normalized.
    pub prefix: String,
}

impl S3Prefix {
    /// Create a prefix, appending a trailing slash if absent.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }

    /// The last path segment, without slashes.
    #[must_use]
    pub fn folder_name(&self) -> &str {
        self.prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }

    /// The parent prefix, or the empty string at the root.
    #[must_use]
    pub fn parent_prefix(&self) -> String {
        let trimmed = self.prefix.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => trimmed[..=idx].to_owned(),
            None => String::new(),
        }
    }
}

/// The parent prefix of an object key (`"a/b/c.jpg"` -> `"a/b/"`).
#[must_use]
pub fn parent_prefix_of(key: &str) -> String {
    match key.rfind('/') {
        Some(idx) => key[..=idx].to_owned(),
        None => String::new(),
    }
}

/// A parsed `ListObjectsV2` page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsList {
    /// Objects on this page.
    pub objects: Vec<S3Object>,
    /// Folder prefixes collapsed by the delimiter.
    pub common_prefixes: Vec<S3Prefix>,
    /// Whether more keys exist beyond this page.
    pub truncated: bool,
    /// Opaque cursor for the next page, when truncated.
    pub next_continuation_token: Option<String>,
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// One CORS configuration rule on a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorsRule {
    /// Optional rule identifier.
    pub id: Option<String>,
    /// HTTP methods the rule allows.
    pub allowed_methods: Vec<String>,
    /// Origins the rule allows (supports the `"*"` wildcard).
    pub allowed_origins: Vec<String>,
    /// Request headers the rule allows (supports the `"*"` wildcard).
    pub allowed_headers: Vec<String>,
    /// Response headers the browser may read.
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime in seconds. Zero is meaningful and distinct
    /// from absent.
    pub max_age_seconds: Option<i32>,
}

impl CorsRule {
    /// Whether this rule permits `origin`.
    #[must_use]
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|o| o == "*" || o == origin)
    }

    /// Whether this rule permits the given HTTP method.
    #[must_use]
    pub fn allows_method(&self, method: &str) -> bool {
        self.allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// A bucket's full CORS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Zero or more rules, evaluated first-match.
    pub rules: Vec<CorsRule>,
}

impl CorsConfig {
    /// Whether browser uploads from `origin` would be permitted: some rule
    /// must allow PUT or POST, match the origin, and allow the content-type
    /// request header (or all headers).
    #[must_use]
    pub fn allows_upload(&self, origin: &str) -> bool {
        self.rules.iter().any(|rule| {
            (rule.allows_method("PUT") || rule.allows_method("POST"))
                && rule.allows_origin(origin)
                && rule
                    .allowed_headers
                    .iter()
                    .any(|h| h == "*" || h.eq_ignore_ascii_case("content-type"))
        })
    }
}

// ---------------------------------------------------------------------------
// Mutation results
// ---------------------------------------------------------------------------

/// The parsed `CopyObjectResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyResult {
    /// ETag of the copy, quotes stripped.
    pub etag: String,
    /// Timestamp of the copy.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One successfully deleted key from a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedObject {
    /// The deleted key.
    pub key: String,
    /// The deleted version, on versioned buckets.
    pub version_id: Option<String>,
}

/// One per-key failure from a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteFailure {
    /// The key that failed.
    pub key: String,
    /// The remote error code.
    pub code: String,
    /// The remote error message.
    pub message: String,
}

/// The parsed `DeleteResult` of a batch delete, keeping successes and
/// failures separate so partial failure is representable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteResult {
    /// Keys that were deleted.
    pub deleted: Vec<DeletedObject>,
    /// Keys that failed, with the remote code and message.
    pub errors: Vec<BatchDeleteFailure>,
}

impl BatchDeleteResult {
    /// Whether every key in the batch was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Merge another batch result into this one.
    pub fn merge(&mut self, other: BatchDeleteResult) {
        self.deleted.extend(other.deleted);
        self.errors.extend(other.errors);
    }
}

/// The outcome of a single-object rename (copy then delete-original).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    /// The original key.
    pub source_key: String,
    /// The new key.
    pub target_key: String,
    /// Whether the copy to the target key succeeded. Always true on any
    /// successful envelope: the copy happens before the delete.
    pub copied: bool,
    /// Whether the original was removed. False on 207 partial success, where
    /// the object exists at both keys.
    pub original_removed: bool,
}

/// The outcome of a prefix (folder) rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePrefixResult {
    /// Keys fully renamed (copied and original deleted).
    pub renamed: Vec<String>,
    /// Keys that failed at some stage, with details.
    pub failures: Vec<OperationFailure>,
}

/// The outcome of a credential capability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPermissions {
    /// Listing succeeded.
    pub read: bool,
    /// A test PUT succeeded.
    pub write: bool,
    /// Deleting the test object succeeded.
    pub delete: bool,
    /// Per-capability error detail for the ones that failed.
    pub errors: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(key: &str) -> S3Object {
        S3Object {
            key: key.to_owned(),
            last_modified: None,
            etag: "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
            size_bytes: 0,
            storage_class: None,
        }
    }

    #[test]
    fn test_should_derive_filename_from_key() {
        assert_eq!(object("photos/2024/cat.jpg").filename(), "cat.jpg");
        assert_eq!(object("cat.jpg").filename(), "cat.jpg");
    }

    #[test]
    fn test_should_derive_mime_type_and_category() {
        let obj = object("photos/cat.JPG");
        assert_eq!(obj.mime_type(), "image/jpeg");
        assert_eq!(obj.category(), ObjectCategory::Image);

        let obj = object("backup.tar");
        assert_eq!(obj.category(), ObjectCategory::Archive);

        let obj = object("mystery");
        assert_eq!(obj.mime_type(), "application/octet-stream");
        assert_eq!(obj.category(), ObjectCategory::Other);
    }

    #[test]
    fn test_should_detect_multipart_etag() {
        let mut obj = object("big.bin");
        assert!(!obj.has_multipart_etag());
        obj.etag = "9bb58f26192e4ba00f01e2e7b136bbd8-12".to_owned();
        assert!(obj.has_multipart_etag());
    }

    #[test]
    fn test_should_normalize_prefix_trailing_slash() {
        assert_eq!(S3Prefix::new("photos/2024").prefix, "photos/2024/");
        assert_eq!(S3Prefix::new("photos/2024/").prefix, "photos/2024/");
    }

    #[test]
    fn test_should_derive_folder_name_and_parent() {
        let p = S3Prefix::new("photos/2024/");
        assert_eq!(p.folder_name(), "2024");
        assert_eq!(p.parent_prefix(), "photos/");

        let root = S3Prefix::new("photos/");
        assert_eq!(root.folder_name(), "photos");
        assert_eq!(root.parent_prefix(), "");
    }

    #[test]
    fn test_should_derive_parent_prefix_of_key() {
        assert_eq!(parent_prefix_of("photos/2024/cat.jpg"), "photos/2024/");
        assert_eq!(parent_prefix_of("cat.jpg"), "");
    }

    #[test]
    fn test_should_detect_upload_ready_cors() {
        let config = CorsConfig {
            rules: vec![CorsRule {
                id: None,
                allowed_methods: vec!["PUT".to_owned()],
                allowed_origins: vec!["https://example.com".to_owned()],
                allowed_headers: vec!["*".to_owned()],
                expose_headers: vec![],
                max_age_seconds: Some(0),
            }],
        };
        assert!(config.allows_upload("https://example.com"));
        assert!(!config.allows_upload("https://other.com"));
    }

    #[test]
    fn test_should_require_upload_method_and_headers() {
        let get_only = CorsConfig {
            rules: vec![CorsRule {
                allowed_methods: vec!["GET".to_owned()],
                allowed_origins: vec!["*".to_owned()],
                allowed_headers: vec!["*".to_owned()],
                ..CorsRule::default()
            }],
        };
        assert!(!get_only.allows_upload("https://example.com"));

        let no_headers = CorsConfig {
            rules: vec![CorsRule {
                allowed_methods: vec!["POST".to_owned()],
                allowed_origins: vec!["*".to_owned()],
                allowed_headers: vec![],
                ..CorsRule::default()
            }],
        };
        assert!(!no_headers.allows_upload("https://example.com"));
    }

    #[test]
    fn test_should_merge_batch_delete_results() {
        let mut a = BatchDeleteResult {
            deleted: vec![DeletedObject {
                key: "a".to_owned(),
                version_id: None,
            }],
            errors: vec![],
        };
        let b = BatchDeleteResult {
            deleted: vec![],
            errors: vec![BatchDeleteFailure {
                key: "b".to_owned(),
                code: "AccessDenied".to_owned(),
                message: "denied".to_owned(),
            }],
        };
        assert!(a.is_complete());
        a.merge(b);
        assert!(!a.is_complete());
        assert_eq!(a.deleted.len(), 1);
        assert_eq!(a.errors.len(), 1);
    }

    #[test]
    fn test_should_round_trip_objects_list_through_serde() {
        let list = ObjectsList {
            objects: vec![object("photos/a.jpg")],
            common_prefixes: vec![S3Prefix::new("photos/raw/")],
            truncated: true,
            next_continuation_token: Some("token".to_owned()),
        };
        let json = serde_json::to_string(&list).expect("serialize");
        let back: ObjectsList = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, list);
    }
}
