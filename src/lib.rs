//! # wordloom
//!
//! Word-processing package (`.docx`) conversion to an editable rich-text
//! model and HTML, and back.
//!
//! Decoding sniffs the input, reads the package once and runs a chain of
//! strategies (letterhead extraction, semantic conversion, style-resolved
//! conversion, tolerant text salvage) until one produces an acceptable
//! result. The result is mapped into a canonical [`DocumentModel`].
//! Encoding serializes a model back into a package.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wordloom::{decode_file, encode, EncodeOptions};
//!
//! let decoded = decode_file("report.docx")?;
//! println!("{}", decoded.html);
//! println!("method: {:?}", decoded.model.metadata.method);
//!
//! let bytes = encode(&decoded.model, &EncodeOptions::default())?;
//! std::fs::write("copy.docx", bytes)?;
//! # Ok::<(), wordloom::Error>(())
//! ```
//!
//! ## HTML in, package out
//!
//! ```no_run
//! let bytes = wordloom::encode_html("<h1>Title</h1><p>Body</p>", &Default::default())?;
//! # Ok::<(), wordloom::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: [`pipeline::decode_async`] on the Tokio blocking pool

pub mod container;
pub mod detect;
pub mod docx;
pub mod error;
pub mod html;
pub mod letterhead;
pub mod model;
pub mod normalize;
pub mod options;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod writer;
pub mod xml;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use detect::{detect_format_from_bytes, detect_format_from_path, sniff, FormatType, Sniffed};
pub use error::{Error, Result};
pub use html::{from_html, to_html};
pub use model::{
    Alignment, Block, DocumentModel, ImageBlock, LetterheadKind, ListItem, ListKind, Metadata,
    ParagraphStyle, Run, RunContent, RunStyle, Table, TableCell, TableRow,
};
pub use options::{DecodeOptions, EncodeOptions};
pub use pipeline::{Decoded, StrategyKind, StrategyResult};
pub use session::{BlobRegistry, DocumentStore, EditorSession};
pub use writer::{encode, DOCX_MEDIA_TYPE};

#[cfg(feature = "async")]
pub use pipeline::decode_async;

use std::path::Path;

/// Decode a buffer with default options.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("report.docx")?;
/// let decoded = wordloom::decode(&data)?;
/// assert!(decoded.model.metadata.method.is_some());
/// # Ok::<(), wordloom::Error>(())
/// ```
pub fn decode(data: &[u8]) -> Result<Decoded> {
    pipeline::decode(data, None, &DecodeOptions::default())
}

/// Decode a buffer. The file name is used for diagnostics only.
pub fn decode_with_options(
    data: &[u8],
    file_name: Option<&str>,
    options: &DecodeOptions,
) -> Result<Decoded> {
    pipeline::decode(data, file_name, options)
}

/// Read and decode a file.
pub fn decode_file(path: impl AsRef<Path>) -> Result<Decoded> {
    decode_file_with_options(path, &DecodeOptions::default())
}

/// Read and decode a file with options.
pub fn decode_file_with_options(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Decoded> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    pipeline::decode(&data, name.as_deref(), options)
}

/// Map HTML into a model and encode it.
pub fn encode_html(html: &str, options: &EncodeOptions) -> Result<Vec<u8>> {
    let model = from_html(html)?;
    encode(&model, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_through_package() {
        let bytes = encode_html("<h2>Plan</h2><p>First <strong>step</strong></p>", &EncodeOptions::default())
            .unwrap();
        assert_eq!(detect_format_from_bytes(&bytes), FormatType::PackagedXml);

        let decoded = decode(&bytes).unwrap();
        let blocks = &decoded.model.blocks;
        assert_eq!(blocks.len(), 2);
        let Block::Heading { level: 2, runs, .. } = &blocks[0] else {
            panic!("expected heading, got {:?}", blocks[0]);
        };
        assert_eq!(model::runs_plain_text(runs), "Plan");
        let Block::Paragraph { runs, .. } = &blocks[1] else {
            panic!("expected paragraph, got {:?}", blocks[1]);
        };
        assert_eq!(runs[0].as_text(), Some("First "));
        assert!(!runs[0].style.bold);
        assert_eq!(runs[1].as_text(), Some("step"));
        assert!(runs[1].style.bold);
        assert_eq!(runs[0].style.font_size, runs[1].style.font_size);
    }

    #[test]
    fn test_unsupported_input() {
        let err = decode(b"{\\rtf1\\ansi hello}").unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_decode_file_records_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.html");
        std::fs::write(&path, "<html><body><p>Hi</p></body></html>").unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.model.metadata.file_name.as_deref(), Some("note.html"));
        assert_eq!(decoded.model.metadata.method.as_deref(), Some("html"));
        assert_eq!(decoded.model.plain_text(), "Hi");
    }
}
