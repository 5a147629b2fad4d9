//! S3 XML response parsing.
//!
//! One parsing function per S3 operation, each converting a raw response body
//! into its `cumulo-model` shape. Parsers walk quick-xml events directly; the
//! reader never resolves external entities, and every document is depth-checked
//! before parsing begins.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use cumulo_model::types::{
    BatchDeleteFailure, BatchDeleteResult, BucketsList, CopyResult, CorsConfig, CorsRule,
    DeletedObject, ObjectsList, Owner, S3Bucket, S3Object, S3Prefix,
};

use crate::error::XmlError;

/// Documents nesting deeper than this are rejected outright.
const MAX_DEPTH: usize = 100;

/// An error code/message pair extracted from an S3 `<Error>` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// The `<Code>` value, verbatim.
    pub code: String,
    /// The `<Message>` value, or empty when absent.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Reader helpers
// ---------------------------------------------------------------------------

fn make_reader(xml: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    reader
}

/// Reject documents that nest beyond [`MAX_DEPTH`] before any real parsing.
fn validate_depth(xml: &[u8]) -> Result<(), XmlError> {
    let mut reader = make_reader(xml);
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(XmlError::DepthLimitExceeded(MAX_DEPTH));
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// The local (namespace-stripped) name of a start tag.
fn local_name(e: &BytesStart<'_>) -> Result<String, XmlError> {
    let name = e.local_name();
    std::str::from_utf8(name.as_ref())
        .map(ToOwned::to_owned)
        .map_err(|err| XmlError::ParseError(err.to_string()))
}

/// Position the reader just past the root start tag and return its local name.
fn read_root(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => return local_name(&e),
            Event::Eof => return Err(XmlError::MissingElement("root element".to_owned())),
            // Skip declaration, comments, DOCTYPE, whitespace. DOCTYPE is
            // consumed as an opaque event; entity definitions are never
            // resolved.
            _ => {}
        }
    }
}

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(XmlError::UnexpectedEof(
                    "while reading text content".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(XmlError::UnexpectedEof("while skipping element".to_owned())),
            _ => {}
        }
    }
}

fn parse_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true")
}

fn parse_u64(s: &str) -> Result<u64, XmlError> {
    s.parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

fn parse_i32(s: &str) -> Result<i32, XmlError> {
    s.parse::<i32>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

/// Parse an ISO 8601 timestamp, tolerating the fractional-second variants
/// different providers emit.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
                .map(|ndt| ndt.and_utc())
        })
        .ok()
}

/// Strip the surrounding quotes S3 puts on ETag values.
fn unquote_etag(etag: &str) -> String {
    etag.trim_matches('"').to_owned()
}

// ---------------------------------------------------------------------------
// <Error> bodies
// ---------------------------------------------------------------------------

/// Extract the `<Error><Code>/<Message>` pair from an S3 error body.
///
/// The `<Error>` element is located anywhere in the document, so wrapped
/// provider variants parse the same as the flat AWS shape.
///
/// # Errors
///
/// Returns `XmlError` when the body is not XML or carries no `<Error>` with a
/// `<Code>`.
pub fn parse_error_response(xml: &[u8]) -> Result<RemoteError, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if local_name(&e)? == "Error" {
                    return parse_error_element(&mut reader);
                }
                // Descend: the next Start event will be this element's child.
            }
            Event::Eof => return Err(XmlError::MissingElement("Error".to_owned())),
            _ => {}
        }
    }
}

fn parse_error_element(reader: &mut Reader<&[u8]>) -> Result<RemoteError, XmlError> {
    let mut code = None;
    let mut message = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Code" => code = Some(read_text_content(reader)?),
                "Message" => message = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Error".to_owned())),
            _ => {}
        }
    }

    Ok(RemoteError {
        code: code.ok_or_else(|| XmlError::MissingElement("Error/Code".to_owned()))?,
        message: message.unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// ListBuckets
// ---------------------------------------------------------------------------

/// Parse a `ListBuckets` response.
///
/// When the root is not the expected `ListAllMyBucketsResult`, or the
/// structured `Buckets/Bucket` walk yields nothing, falls back to a recursive
/// scan that collects any element carrying both `Name` and `CreationDate`
/// children, which survives provider XML-shape drift at either level.
///
/// # Errors
///
/// Returns `XmlError` on malformed XML or depth overflow.
pub fn parse_buckets_list(xml: &[u8]) -> Result<BucketsList, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);
    let root = read_root(&mut reader)?;

    if root != "ListAllMyBucketsResult" {
        debug!(root, "unexpected buckets-list root, scanning for buckets");
        let mut list = BucketsList::default();
        scan_for_buckets(&mut reader, &mut list.buckets)?;
        return Ok(list);
    }

    let mut list = BucketsList::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Owner" => list.owner = Some(parse_owner(&mut reader)?),
                "Buckets" => parse_buckets_container(&mut reader, &mut list.buckets)?,
                "IsTruncated" => list.truncated = parse_bool(&read_text_content(&mut reader)?),
                "NextMarker" | "ContinuationToken" => {
                    let marker = read_text_content(&mut reader)?;
                    if !marker.is_empty() {
                        list.next_marker = Some(marker);
                    }
                }
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }

    // A matching root whose inner structure drifted away from Buckets/Bucket
    // parses to an empty walk; rescan the whole document before trusting it.
    if list.buckets.is_empty() {
        debug!("no Buckets/Bucket path under expected root, scanning for buckets");
        let mut reader = make_reader(xml);
        scan_for_buckets(&mut reader, &mut list.buckets)?;
    }
    Ok(list)
}

fn parse_owner(reader: &mut Reader<&[u8]>) -> Result<Owner, XmlError> {
    let mut owner = Owner::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "ID" => owner.id = Some(read_text_content(reader)?),
                "DisplayName" => owner.display_name = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Owner".to_owned())),
            _ => {}
        }
    }
    Ok(owner)
}

fn parse_buckets_container(
    reader: &mut Reader<&[u8]>,
    out: &mut Vec<S3Bucket>,
) -> Result<(), XmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if local_name(&e)? == "Bucket" {
                    out.push(parse_bucket(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(XmlError::UnexpectedEof("in Buckets".to_owned())),
            _ => {}
        }
    }
}

fn parse_bucket(reader: &mut Reader<&[u8]>) -> Result<S3Bucket, XmlError> {
    let mut name = None;
    let mut creation_date = None;
    let mut region = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Name" => name = Some(read_text_content(reader)?),
                "CreationDate" => {
                    creation_date = parse_timestamp(&read_text_content(reader)?);
                }
                "BucketRegion" | "Region" => region = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Bucket".to_owned())),
            _ => {}
        }
    }

    Ok(S3Bucket {
        name: name.ok_or_else(|| XmlError::MissingElement("Bucket/Name".to_owned()))?,
        creation_date,
        region,
    })
}

/// Collect anything shaped like a bucket (`Name` + `CreationDate` text
/// children) from the current element downward.
fn scan_for_buckets(reader: &mut Reader<&[u8]>, out: &mut Vec<S3Bucket>) -> Result<(), XmlError> {
    let mut name: Option<String> = None;
    let mut creation_date: Option<DateTime<Utc>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Name" => name = Some(read_text_content(reader)?),
                "CreationDate" => creation_date = parse_timestamp(&read_text_content(reader)?),
                _ => scan_for_buckets(reader, out)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }

    if let (Some(name), Some(date)) = (name, creation_date) {
        out.push(S3Bucket {
            name,
            creation_date: Some(date),
            region: None,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ListObjectsV2
// ---------------------------------------------------------------------------

/// Parse a `ListObjectsV2` response into objects, common prefixes, and the
/// pagination cursor.
///
/// `Contents` and `CommonPrefixes` always collect into vectors: a page with
/// one entry and a page with many have the same shape.
///
/// # Errors
///
/// Returns `XmlError` on malformed XML or depth overflow.
pub fn parse_objects_list(xml: &[u8]) -> Result<ObjectsList, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);
    read_root(&mut reader)?;

    let mut list = ObjectsList::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Contents" => list.objects.push(parse_object_entry(&mut reader)?),
                "CommonPrefixes" => parse_common_prefixes(&mut reader, &mut list.common_prefixes)?,
                "IsTruncated" => list.truncated = parse_bool(&read_text_content(&mut reader)?),
                "NextContinuationToken" => {
                    let token = read_text_content(&mut reader)?;
                    if !token.is_empty() {
                        list.next_continuation_token = Some(token);
                    }
                }
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }
    Ok(list)
}

fn parse_object_entry(reader: &mut Reader<&[u8]>) -> Result<S3Object, XmlError> {
    let mut key = None;
    let mut last_modified = None;
    let mut etag = String::new();
    let mut size_bytes = 0u64;
    let mut storage_class = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Key" => key = Some(read_text_content(reader)?),
                "LastModified" => last_modified = parse_timestamp(&read_text_content(reader)?),
                "ETag" => etag = unquote_etag(&read_text_content(reader)?),
                "Size" => size_bytes = parse_u64(&read_text_content(reader)?)?,
                "StorageClass" => storage_class = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Contents".to_owned())),
            _ => {}
        }
    }

    Ok(S3Object {
        key: key.ok_or_else(|| XmlError::MissingElement("Contents/Key".to_owned()))?,
        last_modified,
        etag,
        size_bytes,
        storage_class,
    })
}

fn parse_common_prefixes(
    reader: &mut Reader<&[u8]>,
    out: &mut Vec<S3Prefix>,
) -> Result<(), XmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if local_name(&e)? == "Prefix" {
                    let prefix = read_text_content(reader)?;
                    if !prefix.is_empty() {
                        out.push(S3Prefix::new(prefix));
                    }
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(XmlError::UnexpectedEof("in CommonPrefixes".to_owned())),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// CORS configuration
// ---------------------------------------------------------------------------

/// Parse a `GetBucketCors` response.
///
/// `MaxAgeSeconds` of zero is preserved; zero and absent are different
/// configurations.
///
/// # Errors
///
/// Returns `XmlError` on malformed XML or depth overflow.
pub fn parse_cors_config(xml: &[u8]) -> Result<CorsConfig, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);
    read_root(&mut reader)?;

    let mut config = CorsConfig::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if local_name(&e)? == "CORSRule" {
                    config.rules.push(parse_cors_rule(&mut reader)?);
                } else {
                    skip_element(&mut reader)?;
                }
            }
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }
    Ok(config)
}

fn parse_cors_rule(reader: &mut Reader<&[u8]>) -> Result<CorsRule, XmlError> {
    let mut rule = CorsRule::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "ID" => rule.id = Some(read_text_content(reader)?),
                "AllowedMethod" => rule.allowed_methods.push(read_text_content(reader)?),
                "AllowedOrigin" => rule.allowed_origins.push(read_text_content(reader)?),
                "AllowedHeader" => rule.allowed_headers.push(read_text_content(reader)?),
                "ExposeHeader" => rule.expose_headers.push(read_text_content(reader)?),
                "MaxAgeSeconds" => {
                    rule.max_age_seconds = Some(parse_i32(&read_text_content(reader)?)?);
                }
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in CORSRule".to_owned())),
            _ => {}
        }
    }
    Ok(rule)
}

// ---------------------------------------------------------------------------
// Batch delete
// ---------------------------------------------------------------------------

/// Parse a `DeleteObjects` response, keeping successes and per-key failures
/// separate so partial-failure batches are representable.
///
/// # Errors
///
/// Returns `XmlError` on malformed XML or depth overflow.
pub fn parse_batch_delete_result(xml: &[u8]) -> Result<BatchDeleteResult, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);
    read_root(&mut reader)?;

    let mut result = BatchDeleteResult::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Deleted" => result.deleted.push(parse_deleted_entry(&mut reader)?),
                "Error" => result.errors.push(parse_delete_error_entry(&mut reader)?),
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }
    Ok(result)
}

fn parse_deleted_entry(reader: &mut Reader<&[u8]>) -> Result<DeletedObject, XmlError> {
    let mut key = None;
    let mut version_id = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Key" => key = Some(read_text_content(reader)?),
                "VersionId" => version_id = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Deleted".to_owned())),
            _ => {}
        }
    }
    Ok(DeletedObject {
        key: key.ok_or_else(|| XmlError::MissingElement("Deleted/Key".to_owned()))?,
        version_id,
    })
}

fn parse_delete_error_entry(reader: &mut Reader<&[u8]>) -> Result<BatchDeleteFailure, XmlError> {
    let mut key = None;
    let mut code = None;
    let mut message = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "Key" => key = Some(read_text_content(reader)?),
                "Code" => code = Some(read_text_content(reader)?),
                "Message" => message = Some(read_text_content(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => return Err(XmlError::UnexpectedEof("in Error".to_owned())),
            _ => {}
        }
    }
    Ok(BatchDeleteFailure {
        key: key.ok_or_else(|| XmlError::MissingElement("Error/Key".to_owned()))?,
        code: code.unwrap_or_default(),
        message: message.unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Copy result
// ---------------------------------------------------------------------------

/// Parse a `CopyObject` response.
///
/// # Errors
///
/// Returns `XmlError` when the body carries no `ETag`, is malformed, or
/// exceeds the depth limit.
pub fn parse_copy_result(xml: &[u8]) -> Result<CopyResult, XmlError> {
    validate_depth(xml)?;
    let mut reader = make_reader(xml);
    read_root(&mut reader)?;

    let mut etag = None;
    let mut last_modified = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e)?.as_str() {
                "ETag" => etag = Some(unquote_etag(&read_text_content(&mut reader)?)),
                "LastModified" => {
                    last_modified = parse_timestamp(&read_text_content(&mut reader)?);
                }
                _ => skip_element(&mut reader)?,
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }

    Ok(CopyResult {
        etag: etag.ok_or_else(|| XmlError::MissingElement("CopyObjectResult/ETag".to_owned()))?,
        last_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_buckets_list() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
              <Owner><ID>abc123</ID><DisplayName>ops</DisplayName></Owner>
              <Buckets>
                <Bucket><Name>media</Name><CreationDate>2024-01-15T10:00:00.000Z</CreationDate></Bucket>
                <Bucket><Name>backups</Name><CreationDate>2024-02-01T00:00:00Z</CreationDate></Bucket>
              </Buckets>
              <IsTruncated>false</IsTruncated>
            </ListAllMyBucketsResult>"#;

        let list = parse_buckets_list(xml).expect("parse");
        assert_eq!(list.buckets.len(), 2);
        assert_eq!(list.buckets[0].name, "media");
        assert!(list.buckets[0].creation_date.is_some());
        assert_eq!(
            list.owner.as_ref().and_then(|o| o.id.as_deref()),
            Some("abc123")
        );
        assert!(!list.truncated);
    }

    #[test]
    fn test_should_scan_for_buckets_on_drifted_root() {
        let xml = br"<EnumerateBucketsResponse>
              <Items>
                <Item><Name>media</Name><CreationDate>2024-01-15T10:00:00Z</CreationDate></Item>
              </Items>
            </EnumerateBucketsResponse>";

        let list = parse_buckets_list(xml).expect("parse");
        assert_eq!(list.buckets.len(), 1);
        assert_eq!(list.buckets[0].name, "media");
    }

    #[test]
    fn test_should_scan_for_buckets_when_inner_shape_drifts() {
        // Expected root, but no Buckets/Bucket path underneath.
        let xml = br"<ListAllMyBucketsResult>
              <BucketList>
                <Entry><Name>media</Name><CreationDate>2024-01-15T10:00:00Z</CreationDate></Entry>
                <Entry><Name>backups</Name><CreationDate>2024-02-01T00:00:00Z</CreationDate></Entry>
              </BucketList>
            </ListAllMyBucketsResult>";

        let list = parse_buckets_list(xml).expect("parse");
        assert_eq!(list.buckets.len(), 2);
        assert_eq!(list.buckets[0].name, "media");
        assert_eq!(list.buckets[1].name, "backups");
    }

    #[test]
    fn test_should_keep_empty_buckets_list_empty() {
        let xml = br"<ListAllMyBucketsResult>
              <Owner><ID>abc123</ID></Owner>
              <Buckets></Buckets>
            </ListAllMyBucketsResult>";

        let list = parse_buckets_list(xml).expect("parse");
        assert!(list.buckets.is_empty());
    }

    #[test]
    fn test_should_parse_single_and_multi_contents_to_same_shape() {
        let one = br"<ListBucketResult>
              <Contents><Key>a.jpg</Key><ETag>&quot;e1&quot;</ETag><Size>10</Size></Contents>
              <IsTruncated>false</IsTruncated>
            </ListBucketResult>";
        let two = br"<ListBucketResult>
              <Contents><Key>a.jpg</Key><ETag>&quot;e1&quot;</ETag><Size>10</Size></Contents>
              <Contents><Key>b.jpg</Key><ETag>&quot;e2&quot;</ETag><Size>20</Size></Contents>
              <IsTruncated>false</IsTruncated>
            </ListBucketResult>";

        let one = parse_objects_list(one).expect("parse one");
        let two = parse_objects_list(two).expect("parse two");
        assert_eq!(one.objects.len(), 1);
        assert_eq!(two.objects.len(), 2);
    }

    #[test]
    fn test_should_strip_etag_quotes_and_parse_fields() {
        let xml = br"<ListBucketResult>
              <Contents>
                <Key>photos/cat.jpg</Key>
                <LastModified>2024-03-01T12:30:00.000Z</LastModified>
                <ETag>&quot;9bb58f26192e4ba00f01e2e7b136bbd8&quot;</ETag>
                <Size>52428800</Size>
                <StorageClass>STANDARD</StorageClass>
              </Contents>
            </ListBucketResult>";

        let list = parse_objects_list(xml).expect("parse");
        let obj = &list.objects[0];
        assert_eq!(obj.etag, "9bb58f26192e4ba00f01e2e7b136bbd8");
        assert_eq!(obj.size_bytes, 52_428_800);
        assert_eq!(obj.storage_class.as_deref(), Some("STANDARD"));
        assert!(obj.last_modified.is_some());
    }

    #[test]
    fn test_should_parse_common_prefixes_and_continuation() {
        let xml = br"<ListBucketResult>
              <IsTruncated>true</IsTruncated>
              <NextContinuationToken>tok-123</NextContinuationToken>
              <CommonPrefixes><Prefix>photos/2023/</Prefix></CommonPrefixes>
              <CommonPrefixes><Prefix>photos/2024/</Prefix></CommonPrefixes>
            </ListBucketResult>";

        let list = parse_objects_list(xml).expect("parse");
        assert!(list.truncated);
        assert_eq!(list.next_continuation_token.as_deref(), Some("tok-123"));
        assert_eq!(list.common_prefixes.len(), 2);
        assert_eq!(list.common_prefixes[0].prefix, "photos/2023/");
    }

    #[test]
    fn test_should_parse_namespace_prefixed_elements() {
        let xml = br#"<s3:ListBucketResult xmlns:s3="http://s3.amazonaws.com/doc/2006-03-01/">
              <s3:Contents><s3:Key>a.jpg</s3:Key><s3:Size>1</s3:Size></s3:Contents>
            </s3:ListBucketResult>"#;

        let list = parse_objects_list(xml).expect("parse");
        assert_eq!(list.objects.len(), 1);
        assert_eq!(list.objects[0].key, "a.jpg");
    }

    #[test]
    fn test_should_parse_cors_rules_keeping_zero_max_age() {
        let xml = br"<CORSConfiguration>
              <CORSRule>
                <ID>uploads</ID>
                <AllowedMethod>PUT</AllowedMethod>
                <AllowedMethod>POST</AllowedMethod>
                <AllowedOrigin>https://example.com</AllowedOrigin>
                <AllowedHeader>*</AllowedHeader>
                <ExposeHeader>ETag</ExposeHeader>
                <MaxAgeSeconds>0</MaxAgeSeconds>
              </CORSRule>
            </CORSConfiguration>";

        let config = parse_cors_config(xml).expect("parse");
        assert_eq!(config.rules.len(), 1);
        let rule = &config.rules[0];
        assert_eq!(rule.id.as_deref(), Some("uploads"));
        assert_eq!(rule.allowed_methods, vec!["PUT", "POST"]);
        assert_eq!(rule.max_age_seconds, Some(0));
        assert!(config.allows_upload("https://example.com"));
        assert!(!config.allows_upload("https://other.com"));
    }

    #[test]
    fn test_should_parse_partial_batch_delete_result() {
        let xml = br"<DeleteResult>
              <Deleted><Key>a.jpg</Key></Deleted>
              <Error><Key>b.jpg</Key><Code>AccessDenied</Code><Message>denied</Message></Error>
              <Deleted><Key>c.jpg</Key><VersionId>v7</VersionId></Deleted>
            </DeleteResult>";

        let result = parse_batch_delete_result(xml).expect("parse");
        assert_eq!(result.deleted.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "AccessDenied");
        assert_eq!(result.deleted[1].version_id.as_deref(), Some("v7"));
        assert!(!result.is_complete());
    }

    #[test]
    fn test_should_parse_copy_result() {
        let xml = br"<CopyObjectResult>
              <ETag>&quot;e3b0c44298fc&quot;</ETag>
              <LastModified>2024-03-01T12:30:00Z</LastModified>
            </CopyObjectResult>";

        let result = parse_copy_result(xml).expect("parse");
        assert_eq!(result.etag, "e3b0c44298fc");
        assert!(result.last_modified.is_some());
    }

    #[test]
    fn test_should_parse_error_response() {
        let xml = br"<?xml version='1.0'?>
            <Error>
              <Code>NoSuchBucket</Code>
              <Message>The specified bucket does not exist</Message>
              <Resource>/media</Resource>
            </Error>";

        let err = parse_error_response(xml).expect("parse");
        assert_eq!(err.code, "NoSuchBucket");
        assert_eq!(err.message, "The specified bucket does not exist");
    }

    #[test]
    fn test_should_fail_on_error_body_without_code() {
        let xml = br"<Error><Message>nope</Message></Error>";
        assert!(matches!(
            parse_error_response(xml),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_should_fail_on_non_xml_body() {
        assert!(parse_error_response(b"<html><body>gateway timeout").is_err());
        assert!(parse_error_response(b"not xml at all").is_err());
    }

    #[test]
    fn test_should_reject_documents_beyond_depth_limit() {
        let mut xml = String::new();
        for i in 0..120 {
            xml.push_str(&format!("<d{i}>"));
        }
        for i in (0..120).rev() {
            xml.push_str(&format!("</d{i}>"));
        }
        assert!(matches!(
            parse_objects_list(xml.as_bytes()),
            Err(XmlError::DepthLimitExceeded(_))
        ));
    }

    #[test]
    fn test_should_not_resolve_external_entities() {
        // A document defining and referencing an entity: the reference must
        // never be expanded into the parsed value.
        let xml = br#"<?xml version="1.0"?>
            <!DOCTYPE r [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
            <ListBucketResult>
              <Contents><Key>&xxe;</Key></Contents>
            </ListBucketResult>"#;

        match parse_objects_list(xml) {
            // Either the reference is rejected outright...
            Err(_) => {}
            // ...or it survives as an unexpanded literal, never file content.
            Ok(list) => {
                if let Some(obj) = list.objects.first() {
                    assert!(!obj.key.contains("root:"));
                }
            }
        }
    }

    #[test]
    fn test_should_fail_on_empty_document() {
        assert!(matches!(
            parse_buckets_list(b""),
            Err(XmlError::MissingElement(_))
        ));
    }
}
