//! XML codec errors.

use std::io;

/// Errors that can occur during S3 XML parsing or serialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// The document ended in the middle of an element.
    #[error("unexpected end of XML: {0}")]
    UnexpectedEof(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// The document nests deeper than the hard limit.
    #[error("XML document exceeds maximum depth of {0}")]
    DepthLimitExceeded(usize),
}
