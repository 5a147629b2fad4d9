//! S3 XML request-body serialization.
//!
//! Produces the two request bodies the protocol requires XML for: a CORS
//! configuration (`PutBucketCors`) and a batch-delete manifest
//! (`DeleteObjects`). Output follows the AWS RestXml conventions:
//!
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use cumulo_model::types::{CorsConfig, CorsRule};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Serialize a CORS configuration into a `PutBucketCors` request body.
///
/// `MaxAgeSeconds` is written whenever present, including zero.
///
/// # Errors
///
/// Returns `XmlError` if writing to the buffer fails.
pub fn cors_config_to_xml(config: &CorsConfig) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("CORSConfiguration")
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| {
            for rule in &config.rules {
                write_cors_rule(w, rule)?;
            }
            Ok(())
        })?;

    Ok(buf)
}

fn write_cors_rule<W: Write>(writer: &mut Writer<W>, rule: &CorsRule) -> io::Result<()> {
    writer.create_element("CORSRule").write_inner_content(|w| {
        if let Some(id) = &rule.id {
            write_text_element(w, "ID", id)?;
        }
        for origin in &rule.allowed_origins {
            write_text_element(w, "AllowedOrigin", origin)?;
        }
        for method in &rule.allowed_methods {
            write_text_element(w, "AllowedMethod", method)?;
        }
        for header in &rule.allowed_headers {
            write_text_element(w, "AllowedHeader", header)?;
        }
        for header in &rule.expose_headers {
            write_text_element(w, "ExposeHeader", header)?;
        }
        if let Some(max_age) = rule.max_age_seconds {
            write_text_element(w, "MaxAgeSeconds", &max_age.to_string())?;
        }
        Ok(())
    })?;
    Ok(())
}

/// Serialize a batch-delete manifest into a `DeleteObjects` request body.
///
/// With `quiet` set, the response lists only failures. Callers are expected
/// to chunk key lists to the protocol limit of 1000 before serializing.
///
/// # Errors
///
/// Returns `XmlError` if writing to the buffer fails.
pub fn batch_delete_to_xml(keys: &[String], quiet: bool) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256 + keys.len() * 64);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("Delete")
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| {
            write_text_element(w, "Quiet", if quiet { "true" } else { "false" })?;
            for key in keys {
                w.create_element("Object")
                    .write_inner_content(|w| write_text_element(w, "Key", key))?;
            }
            Ok(())
        })?;

    Ok(buf)
}

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::{parse_cors_config, parse_objects_list};

    fn upload_rule(origin: &str) -> CorsRule {
        CorsRule {
            id: Some("uploads".to_owned()),
            allowed_methods: vec!["PUT".to_owned(), "POST".to_owned()],
            allowed_origins: vec![origin.to_owned()],
            allowed_headers: vec!["*".to_owned()],
            expose_headers: vec!["ETag".to_owned()],
            max_age_seconds: Some(3600),
        }
    }

    #[test]
    fn test_should_serialize_cors_config() {
        let config = CorsConfig {
            rules: vec![upload_rule("https://example.com")],
        };
        let xml = cors_config_to_xml(&config).expect("serialize");
        let text = String::from_utf8(xml).expect("utf-8");

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(r#"<CORSConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">"#));
        assert!(text.contains("<AllowedOrigin>https://example.com</AllowedOrigin>"));
        assert!(text.contains("<AllowedMethod>PUT</AllowedMethod>"));
        assert!(text.contains("<MaxAgeSeconds>3600</MaxAgeSeconds>"));
    }

    #[test]
    fn test_should_write_zero_max_age() {
        let mut rule = upload_rule("*");
        rule.max_age_seconds = Some(0);
        let config = CorsConfig { rules: vec![rule] };
        let text = String::from_utf8(cors_config_to_xml(&config).expect("serialize")).unwrap();
        assert!(text.contains("<MaxAgeSeconds>0</MaxAgeSeconds>"));
    }

    #[test]
    fn test_should_survive_a_parse_round_trip() {
        let config = CorsConfig {
            rules: vec![upload_rule("https://blog.example.com")],
        };
        let xml = cors_config_to_xml(&config).expect("serialize");
        let parsed = parse_cors_config(&xml).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_should_serialize_batch_delete_manifest() {
        let keys = vec!["a.jpg".to_owned(), "photos/b & c.jpg".to_owned()];
        let xml = batch_delete_to_xml(&keys, true).expect("serialize");
        let text = String::from_utf8(xml).expect("utf-8");

        assert!(text.contains(r#"<Delete xmlns="http://s3.amazonaws.com/doc/2006-03-01/">"#));
        assert!(text.contains("<Quiet>true</Quiet>"));
        assert!(text.contains("<Object><Key>a.jpg</Key></Object>"));
        // Ampersands must be escaped on the wire.
        assert!(text.contains("photos/b &amp; c.jpg"));
    }

    #[test]
    fn test_should_escape_xml_special_characters_in_keys() {
        let keys = vec!["<weird>/key".to_owned()];
        let xml = batch_delete_to_xml(&keys, false).expect("serialize");
        let text = String::from_utf8(xml).expect("utf-8");
        assert!(text.contains("&lt;weird&gt;/key"));

        // And the escaping must reverse cleanly on the way back in.
        let listing =
            b"<ListBucketResult><Contents><Key>&lt;weird&gt;/key</Key><Size>1</Size></Contents></ListBucketResult>";
        let parsed = parse_objects_list(listing).expect("parse");
        assert_eq!(parsed.objects[0].key, "<weird>/key");
    }
}
