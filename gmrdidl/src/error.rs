//! Errors raised while reading or writing DIDL-Lite documents.
//!
//! None of these reach the callers of [`crate::TrackMetadata::to_xml`]: an
//! unreadable prior document simply triggers a rebuild.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DidlError>;

#[derive(Error, Debug)]
pub enum DidlError {
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8 in XML input: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid UTF-8 in XML output: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("Unknown entity reference &{0};")]
    UnknownEntity(String),

    #[error("Unbalanced element tags")]
    Unbalanced,
}

impl DidlError {
    pub fn malformed(message: impl ToString) -> Self {
        DidlError::Malformed(message.to_string())
    }
}
