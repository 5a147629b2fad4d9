//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request format:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! A wrong byte anywhere here produces a `SignatureDoesNotMatch` from the
//! remote service with no local way to tell what went wrong, so every
//! component is normalized exactly as the specification requires.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// The set of characters that must be percent-encoded in URI path segments
/// and query components.
///
/// Per the SigV4 spec, everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded. Forward slashes in the
/// path are preserved by encoding segment-by-segment.
const SIGV4_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single path segment or query component.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, SIGV4_ENCODE_SET).to_string()
}

/// Build the canonical URI from a raw (unencoded) path.
///
/// Each segment is percent-encoded exactly once; `/` separators are
/// preserved. Empty paths normalize to `/`.
///
/// # Examples
///
/// ```
/// use cumulo_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
/// assert_eq!(build_canonical_uri("/my photos/cat.jpg"), "/my%20photos/cat.jpg");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical query string from raw key/value pairs.
///
/// Keys and values are percent-encoded, then sorted byte-wise ascending by
/// key (and by value for duplicate keys).
///
/// # Examples
///
/// ```
/// use cumulo_auth::canonical::build_canonical_query_string;
///
/// let params = [
///     ("prefix".to_owned(), "photos/".to_owned()),
///     ("delimiter".to_owned(), "/".to_owned()),
/// ];
/// assert_eq!(
///     build_canonical_query_string(&params),
///     "delimiter=%2F&prefix=photos%2F"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers string.
///
/// Header names are lowercased, values trimmed with internal whitespace
/// collapsed, duplicates comma-joined, and the result sorted by name. The
/// trailing newline of the canonical-request format is added by the caller.
#[must_use]
pub fn build_canonical_headers(headers: &[(String, String)]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    header_map
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the signed-headers list: lowercase names, sorted, `;`-joined.
#[must_use]
pub fn build_signed_headers_string(headers: &[(String, String)]) -> String {
    let mut names: Vec<String> = headers.iter().map(|(n, _)| n.to_lowercase()).collect();
    names.sort_unstable();
    names.dedup();
    names.join(";")
}

/// Assemble the full canonical request.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers}\n{payload_hash}"
    )
}

/// Collapse consecutive whitespace characters to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_should_normalize_empty_path_to_slash() {
        assert_eq!(build_canonical_uri(""), "/");
        assert_eq!(build_canonical_uri("/"), "/");
    }

    #[test]
    fn test_should_encode_path_segments_preserving_slashes() {
        assert_eq!(
            build_canonical_uri("/my photos/cat+dog.jpg"),
            "/my%20photos/cat%2Bdog.jpg"
        );
    }

    #[test]
    fn test_should_not_encode_unreserved_characters() {
        assert_eq!(
            build_canonical_uri("/a-b_c.d~e/file"),
            "/a-b_c.d~e/file"
        );
    }

    #[test]
    fn test_should_sort_query_parameters_bytewise() {
        let params = pairs(&[("list-type", "2"), ("delimiter", "/"), ("prefix", "a/")]);
        assert_eq!(
            build_canonical_query_string(&params),
            "delimiter=%2F&list-type=2&prefix=a%2F"
        );
    }

    #[test]
    fn test_should_encode_query_values() {
        let params = pairs(&[("prefix", "my photos/")]);
        assert_eq!(
            build_canonical_query_string(&params),
            "prefix=my%20photos%2F"
        );
    }

    #[test]
    fn test_should_sort_duplicate_query_keys_by_value() {
        let params = pairs(&[("k", "b"), ("k", "a")]);
        assert_eq!(build_canonical_query_string(&params), "k=a&k=b");
    }

    #[test]
    fn test_should_return_empty_query_for_no_params() {
        assert_eq!(build_canonical_query_string(&[]), "");
    }

    #[test]
    fn test_should_build_canonical_headers_sorted_and_lowercased() {
        let headers = pairs(&[
            ("x-amz-date", "20130524T000000Z"),
            ("Host", "examplebucket.s3.amazonaws.com"),
        ]);
        assert_eq!(
            build_canonical_headers(&headers),
            "host:examplebucket.s3.amazonaws.com\nx-amz-date:20130524T000000Z"
        );
    }

    #[test]
    fn test_should_collapse_whitespace_in_header_values() {
        let headers = pairs(&[("X-Custom", "  a   b  ")]);
        assert_eq!(build_canonical_headers(&headers), "x-custom:a b");
    }

    #[test]
    fn test_should_build_signed_headers_string_sorted() {
        let headers = pairs(&[("x-amz-date", "t"), ("Host", "h"), ("Range", "r")]);
        assert_eq!(build_signed_headers_string(&headers), "host;range;x-amz-date");
    }

    #[test]
    fn test_should_build_canonical_request_matching_aws_example() {
        use sha2::{Digest, Sha256};

        let headers = pairs(&[
            ("host", "examplebucket.s3.amazonaws.com"),
            ("range", "bytes=0-9"),
            (
                "x-amz-content-sha256",
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            ),
            ("x-amz-date", "20130524T000000Z"),
        ]);

        let canonical = build_canonical_request(
            "GET",
            &build_canonical_uri("/test.txt"),
            "",
            &build_canonical_headers(&headers),
            &build_signed_headers_string(&headers),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        );

        // Hash published in the AWS SigV4 test suite for this request.
        let hash = hex::encode(Sha256::digest(canonical.as_bytes()));
        assert_eq!(
            hash,
            "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972"
        );
    }
}
