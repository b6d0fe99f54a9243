//! # gmrdidl - DIDL-Lite track metadata
//!
//! Holds the metadata of the track a renderer is playing and renders it as
//! the DIDL-Lite XML exchanged through UPnP AVTransport variables.
//!
//! ```
//! use gmrdidl::{TagKey, TrackMetadata};
//!
//! let mut metadata = TrackMetadata::with_id(1);
//! metadata.set(TagKey::Title, "Song A");
//!
//! let xml = metadata.to_xml("");
//! assert!(xml.contains(r#"id="gmr-00000001""#));
//! assert!(xml.contains("<dc:title>Song A</dc:title>"));
//!
//! // Nothing changed: the document comes back untouched.
//! assert_eq!(metadata.to_xml(&xml), xml);
//! ```

mod document;
mod error;
mod metadata;

pub use document::{NS_DC, NS_DIDL_LITE, NS_UPNP};
pub use error::DidlError;
pub use metadata::{Tag, TagKey, TrackMetadata};
