//! Storage-provider addressing rules.
//!
//! A [`Provider`] is pure data plus URL logic: endpoint template, path-style
//! vs virtual-hosted-style convention, the region table, and per-bucket
//! custom domains and public URLs. It performs no I/O.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use cumulo_model::ErrorResponse;

/// Characters left verbatim when encoding object keys into URL paths:
/// RFC 3986 unreserved, plus the `/` segment separator.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode an object key for use in a URL path, preserving `/`.
///
/// A literal `+` is normalized to a space first, matching S3 key semantics
/// for keys that passed through query-string encoding.
#[must_use]
pub fn encode_key(key: &str) -> String {
    let normalized = key.replace('+', " ");
    utf8_percent_encode(&normalized, KEY_ENCODE_SET).to_string()
}

/// The bucket/key pair recovered from a provider URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// The addressed bucket.
    pub bucket: String,
    /// The object key, percent-decoded; empty for bucket-level URLs.
    pub key: String,
}

/// One storage backend's addressing rules.
///
/// Constructed once at startup via a preset ([`Provider::aws`],
/// [`Provider::r2`], [`Provider::spaces`], [`Provider::minio`]) or
/// [`Provider::custom`], and read-only afterwards except for custom-domain
/// and public-URL registration.
#[derive(Debug, Clone)]
pub struct Provider {
    id: String,
    label: String,
    region: String,
    available_regions: BTreeMap<String, String>,
    path_style: bool,
    endpoint_template: String,
    account_id: Option<String>,
    custom_domains: BTreeMap<String, String>,
    public_urls: BTreeMap<String, String>,
}

impl Provider {
    /// Amazon S3, virtual-hosted-style.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when `region` is not a known AWS region.
    pub fn aws(region: &str) -> Result<Self, ErrorResponse> {
        Self::custom(
            "aws",
            "Amazon S3",
            "s3.{region}.amazonaws.com",
            false,
            aws_regions(),
            region,
        )
    }

    /// Cloudflare R2, path-style, addressed by account ID.
    #[must_use]
    pub fn r2(account_id: &str) -> Self {
        let mut regions = BTreeMap::new();
        regions.insert("auto".to_owned(), "Automatic".to_owned());
        Self {
            id: "r2".to_owned(),
            label: "Cloudflare R2".to_owned(),
            region: "auto".to_owned(),
            available_regions: regions,
            path_style: true,
            endpoint_template: "{account_id}.r2.cloudflarestorage.com".to_owned(),
            account_id: Some(account_id.to_owned()),
            custom_domains: BTreeMap::new(),
            public_urls: BTreeMap::new(),
        }
    }

    /// DigitalOcean Spaces, virtual-hosted-style.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when `region` is not a Spaces region.
    pub fn spaces(region: &str) -> Result<Self, ErrorResponse> {
        Self::custom(
            "spaces",
            "DigitalOcean Spaces",
            "{region}.digitaloceanspaces.com",
            false,
            spaces_regions(),
            region,
        )
    }

    /// MinIO or any other self-hosted endpoint, path-style.
    ///
    /// `endpoint` is a bare hostname (optionally with port), e.g.
    /// `minio.internal:9000`. Region defaults to `us-east-1`, which MinIO
    /// accepts for SigV4 unless configured otherwise.
    #[must_use]
    pub fn minio(endpoint: &str) -> Self {
        let mut regions = BTreeMap::new();
        regions.insert("us-east-1".to_owned(), "Default".to_owned());
        Self {
            id: "minio".to_owned(),
            label: "MinIO".to_owned(),
            region: "us-east-1".to_owned(),
            available_regions: regions,
            path_style: true,
            endpoint_template: endpoint.to_owned(),
            account_id: None,
            custom_domains: BTreeMap::new(),
            public_urls: BTreeMap::new(),
        }
    }

    /// Build a provider from explicit addressing rules.
    ///
    /// The endpoint template may contain `{region}` and `{account_id}`
    /// placeholders.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when `region` is not in
    /// `available_regions`; the message enumerates the valid codes.
    pub fn custom(
        id: &str,
        label: &str,
        endpoint_template: &str,
        path_style: bool,
        available_regions: BTreeMap<String, String>,
        region: &str,
    ) -> Result<Self, ErrorResponse> {
        if !available_regions.contains_key(region) {
            let valid = available_regions
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ErrorResponse::invalid_argument(format!(
                "unknown region '{region}' for provider '{id}'; valid regions: {valid}"
            )));
        }
        Ok(Self {
            id: id.to_owned(),
            label: label.to_owned(),
            region: region.to_owned(),
            available_regions,
            path_style,
            endpoint_template: endpoint_template.to_owned(),
            account_id: None,
            custom_domains: BTreeMap::new(),
            public_urls: BTreeMap::new(),
        })
    }

    /// Attach the account ID some endpoint templates require.
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Provider identifier, e.g. `aws`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable provider name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The configured region code.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether this provider addresses buckets in the URL path.
    #[must_use]
    pub fn path_style(&self) -> bool {
        self.path_style
    }

    /// The region code → label table for this provider.
    #[must_use]
    pub fn available_regions(&self) -> &BTreeMap<String, String> {
        &self.available_regions
    }

    /// Resolve the concrete endpoint hostname.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when the template needs an account ID and
    /// none is configured.
    pub fn endpoint(&self) -> Result<String, ErrorResponse> {
        let mut endpoint = self.endpoint_template.replace("{region}", &self.region);
        if endpoint.contains("{account_id}") {
            let account_id = self.account_id.as_deref().ok_or_else(|| {
                ErrorResponse::invalid_argument(format!(
                    "provider '{}' requires an account ID to build its endpoint",
                    self.id
                ))
            })?;
            endpoint = endpoint.replace("{account_id}", account_id);
        }
        Ok(endpoint)
    }

    /// The host a request for `bucket` is addressed to. An empty bucket
    /// addresses the service endpoint itself.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when the endpoint cannot be resolved.
    pub fn host_for_bucket(&self, bucket: &str) -> Result<String, ErrorResponse> {
        let endpoint = self.endpoint()?;
        if bucket.is_empty() || self.path_style {
            Ok(endpoint)
        } else {
            Ok(format!("{bucket}.{endpoint}"))
        }
    }

    /// Full `https` URL for `bucket`/`key`, with the key percent-encoded
    /// (slashes preserved).
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when the endpoint cannot be resolved.
    pub fn format_url(&self, bucket: &str, key: &str) -> Result<String, ErrorResponse> {
        let endpoint = self.endpoint()?;
        let encoded = encode_key(key);
        if self.path_style {
            if encoded.is_empty() {
                Ok(format!("https://{endpoint}/{bucket}"))
            } else {
                Ok(format!("https://{endpoint}/{bucket}/{encoded}"))
            }
        } else {
            Ok(format!("https://{bucket}.{endpoint}/{encoded}"))
        }
    }

    /// The raw, unencoded canonical path for signing. Percent-encoding is
    /// applied exactly once, at the signing stage. An empty bucket yields `/`
    /// for service-level operations.
    #[must_use]
    pub fn format_canonical_uri(&self, bucket: &str, key: &str) -> String {
        if bucket.is_empty() {
            return "/".to_owned();
        }
        // Same `+` normalization as the wire URL, so the signed path and the
        // sent path stay byte-identical after encoding.
        let key = key.replace('+', " ");
        if self.path_style {
            if key.is_empty() {
                format!("/{bucket}")
            } else {
                format!("/{bucket}/{key}")
            }
        } else {
            format!("/{key}")
        }
    }

    /// Whether `url` addresses this provider (any configured topology).
    #[must_use]
    pub fn is_provider_url(&self, url: &str) -> bool {
        self.parse_provider_url(url).is_some()
    }

    /// Recover the bucket and key from a URL, trying path-style, then
    /// virtual-hosted-style, then custom domains.
    ///
    /// When several custom domains match the host, the longest configured
    /// domain wins, so `cdn.example.com` always beats `example.com`.
    #[must_use]
    pub fn parse_provider_url(&self, url: &str) -> Option<ParsedUrl> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let (host_port, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        let path = path.split('?').next().unwrap_or(path);
        let host = host_port.split(':').next().unwrap_or(host_port);
        let endpoint = self.endpoint().ok()?;
        let endpoint_host = endpoint.split(':').next().unwrap_or(&endpoint);

        // Path-style: https://endpoint/bucket/key
        if host == endpoint_host {
            let (bucket, key) = match path.find('/') {
                Some(idx) => (&path[..idx], &path[idx + 1..]),
                None => (path, ""),
            };
            if bucket.is_empty() {
                return None;
            }
            return Some(ParsedUrl {
                bucket: bucket.to_owned(),
                key: decode_key(key)?,
            });
        }

        // Virtual-hosted-style: https://bucket.endpoint/key
        if let Some(bucket) = host.strip_suffix(&format!(".{endpoint_host}")) {
            if !bucket.is_empty() {
                return Some(ParsedUrl {
                    bucket: bucket.to_owned(),
                    key: decode_key(path)?,
                });
            }
        }

        // Custom domains, longest configured domain first.
        let mut best: Option<(&str, &str)> = None;
        for (bucket, domain) in &self.custom_domains {
            let matches = host == domain || host.ends_with(&format!(".{domain}"));
            if matches && best.is_none_or(|(_, d)| domain.len() > d.len()) {
                best = Some((bucket, domain));
            }
        }
        let (bucket, _) = best?;
        Some(ParsedUrl {
            bucket: bucket.to_owned(),
            key: decode_key(path)?,
        })
    }

    /// Register a custom domain serving `bucket`.
    ///
    /// Domains are matched exactly (or at a label boundary), with the longest
    /// domain winning on overlap, so `cdn.example.com.evil.com` can never
    /// shadow `cdn.example.com`. Avoid mapping two domains where one is a
    /// suffix of the other to different buckets.
    pub fn add_custom_domain(&mut self, bucket: impl Into<String>, domain: impl Into<String>) {
        self.custom_domains.insert(bucket.into(), domain.into());
    }

    /// Register a public base URL (e.g. a CDN distribution) for `bucket`.
    pub fn set_public_url(&mut self, bucket: impl Into<String>, base_url: impl Into<String>) {
        self.public_urls.insert(bucket.into(), base_url.into());
    }

    /// The public URL for an object: the configured public base URL if any,
    /// else the custom domain, else the provider URL.
    ///
    /// # Errors
    ///
    /// Returns `invalid_argument` when falling back to the provider URL and
    /// the endpoint cannot be resolved.
    pub fn format_public_url(&self, bucket: &str, key: &str) -> Result<String, ErrorResponse> {
        let encoded = encode_key(key);
        if let Some(base) = self.public_urls.get(bucket) {
            return Ok(format!("{}/{encoded}", base.trim_end_matches('/')));
        }
        if let Some(domain) = self.custom_domains.get(bucket) {
            return Ok(format!("https://{domain}/{encoded}"));
        }
        self.format_url(bucket, key)
    }
}

fn decode_key(path: &str) -> Option<String> {
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

fn aws_regions() -> BTreeMap<String, String> {
    [
        ("us-east-1", "US East (N. Virginia)"),
        ("us-east-2", "US East (Ohio)"),
        ("us-west-1", "US West (N. California)"),
        ("us-west-2", "US West (Oregon)"),
        ("ca-central-1", "Canada (Central)"),
        ("eu-west-1", "Europe (Ireland)"),
        ("eu-west-2", "Europe (London)"),
        ("eu-west-3", "Europe (Paris)"),
        ("eu-central-1", "Europe (Frankfurt)"),
        ("eu-north-1", "Europe (Stockholm)"),
        ("ap-southeast-1", "Asia Pacific (Singapore)"),
        ("ap-southeast-2", "Asia Pacific (Sydney)"),
        ("ap-northeast-1", "Asia Pacific (Tokyo)"),
        ("ap-northeast-2", "Asia Pacific (Seoul)"),
        ("ap-south-1", "Asia Pacific (Mumbai)"),
        ("sa-east-1", "South America (São Paulo)"),
    ]
    .into_iter()
    .map(|(code, label)| (code.to_owned(), label.to_owned()))
    .collect()
}

fn spaces_regions() -> BTreeMap<String, String> {
    [
        ("nyc3", "New York"),
        ("ams3", "Amsterdam"),
        ("sgp1", "Singapore"),
        ("fra1", "Frankfurt"),
        ("sfo2", "San Francisco 2"),
        ("sfo3", "San Francisco 3"),
        ("syd1", "Sydney"),
        ("blr1", "Bangalore"),
    ]
    .into_iter()
    .map(|(code, label)| (code.to_owned(), label.to_owned()))
    .collect()
}
