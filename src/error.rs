//! Error types for the wordloom library.

use std::io;
use thiserror::Error;

/// Result type alias for wordloom operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding or encoding documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is a format this library does not decode (legacy binary
    /// `.doc`, RTF, or something unrecognizable).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The input is a zip package but is missing parts every word-processing
    /// package must have, or its container structure is unreadable.
    #[error("Corrupt package: {0}")]
    CorruptPackage(String),

    /// Error reading or writing a ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Error interpreting HTML content.
    #[error("HTML error: {0}")]
    Html(String),

    /// Invalid or malformed data in the document.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required document component is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Building or patching an output package failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// JSON serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this is the distinguished "format not supported" condition
    /// callers present with a tailored message.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Error::UnsupportedFormat(_))
    }

    /// Whether this error marks a structurally invalid package.
    pub fn is_corrupt_package(&self) -> bool {
        matches!(self, Error::CorruptPackage(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedFormat("legacy .doc".to_string());
        assert_eq!(err.to_string(), "Unsupported format: legacy .doc");

        let err = Error::CorruptPackage("missing word/document.xml".to_string());
        assert_eq!(
            err.to_string(),
            "Corrupt package: missing word/document.xml"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::UnsupportedFormat("rtf".into()).is_unsupported_format());
        assert!(!Error::CorruptPackage("x".into()).is_unsupported_format());
        assert!(Error::CorruptPackage("x".into()).is_corrupt_package());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
