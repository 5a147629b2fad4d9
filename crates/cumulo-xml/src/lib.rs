//! S3 XML codec.
//!
//! Converts the XML dialects spoken by S3-compatible providers into the typed
//! shapes of `cumulo-model`, and serializes the request bodies the protocol
//! requires (CORS configuration, batch-delete manifests).
//!
//! The parser is built for hostile and drifting input:
//!
//! - repeated elements always collect into a `Vec`, so one entry and many
//!   entries have the same logical shape;
//! - element matching uses local names, so namespace prefixes never matter;
//! - document depth is bounded, and external entities are never resolved.

pub mod de;
pub mod error;
pub mod ser;

pub use de::{
    RemoteError, parse_batch_delete_result, parse_buckets_list, parse_copy_result,
    parse_cors_config, parse_error_response, parse_objects_list,
};
pub use error::XmlError;
pub use ser::{batch_delete_to_xml, cors_config_to_xml};
