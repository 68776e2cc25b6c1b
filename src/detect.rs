//! Input format detection.
//!
//! Classifies a byte buffer by signature first (zip local-file header,
//! compound-binary header) and by textual markers otherwise. The optional
//! file name never changes the classification; it only feeds diagnostics.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Compound File Binary magic used by legacy `.doc` files.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Content type for the main part of a word-processing package.
pub(crate) const DOCX_MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Macro-enabled and template variants share the word-processing layout.
const WORDPROCESSING_MARKER: &str = "wordprocessingml";

/// How many leading bytes the text heuristics look at.
const TEXT_PROBE_LEN: usize = 4096;

/// Detected input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    /// Zip-packaged word-processing XML (.docx, .docm, .dotx)
    PackagedXml,
    /// Compound-binary legacy document (.doc)
    LegacyBinary,
    /// An HTML document or fragment
    Html,
    /// MIME HTML archive (multipart/related)
    Mhtml,
    /// Rich Text Format
    Rtf,
    /// Anything else
    Unknown,
}

impl FormatType {
    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::PackagedXml => "docx",
            FormatType::LegacyBinary => "doc",
            FormatType::Html => "html",
            FormatType::Mhtml => "mht",
            FormatType::Rtf => "rtf",
            FormatType::Unknown => "",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::PackagedXml => "Word Document",
            FormatType::LegacyBinary => "Legacy Word Binary Document",
            FormatType::Html => "HTML Document",
            FormatType::Mhtml => "MHTML Archive",
            FormatType::Rtf => "Rich Text Document",
            FormatType::Unknown => "Unknown",
        }
    }

    /// Whether the decoder accepts this format.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            FormatType::PackagedXml | FormatType::Html | FormatType::Mhtml
        )
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classification result with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Sniffed {
    pub format: FormatType,
    /// Diagnostics such as a disguised extension.
    pub warnings: Vec<String>,
}

/// Detect the format type from a byte slice.
///
/// # Example
///
/// ```no_run
/// use wordloom::detect::{detect_format_from_bytes, FormatType};
///
/// let data = std::fs::read("document.docx")?;
/// assert_eq!(detect_format_from_bytes(&data), FormatType::PackagedXml);
/// # Ok::<(), wordloom::Error>(())
/// ```
pub fn detect_format_from_bytes(data: &[u8]) -> FormatType {
    if is_zip_file(data) {
        return detect_zip(data);
    }
    if data.len() >= OLE_MAGIC.len() && data[..OLE_MAGIC.len()] == OLE_MAGIC {
        return FormatType::LegacyBinary;
    }
    detect_text(data)
}

/// Detect the format type from a file path.
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let data = std::fs::read(path.as_ref())?;
    Ok(detect_format_from_bytes(&data))
}

/// Classify input and collect diagnostics about the file name hint.
pub fn sniff(data: &[u8], file_name: Option<&str>) -> Sniffed {
    let format = detect_format_from_bytes(data);
    let mut warnings = Vec::new();

    if let Some(name) = file_name {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let expected: &[&str] = match format {
            FormatType::PackagedXml => &["docx", "docm", "dotx", "dotm"],
            FormatType::LegacyBinary => &["doc", "dot"],
            FormatType::Html => &["html", "htm", "xhtml"],
            FormatType::Mhtml => &["mht", "mhtml"],
            FormatType::Rtf => &["rtf"],
            FormatType::Unknown => &[],
        };
        if !ext.is_empty() && !expected.is_empty() && !expected.contains(&ext.as_str()) {
            warnings.push(format!(
                "disguised input: '{}' carries {} content",
                name,
                format.name()
            ));
        }
    }

    Sniffed { format, warnings }
}

/// Return an error for formats the decoder does not handle.
pub fn ensure_supported(format: FormatType) -> Result<()> {
    match format {
        FormatType::PackagedXml | FormatType::Html | FormatType::Mhtml => Ok(()),
        FormatType::LegacyBinary => Err(Error::UnsupportedFormat(
            "legacy binary .doc documents are not supported; save as .docx".to_string(),
        )),
        FormatType::Rtf => Err(Error::UnsupportedFormat(
            "RTF documents are not supported".to_string(),
        )),
        FormatType::Unknown => Err(Error::UnsupportedFormat(
            "unrecognized document format".to_string(),
        )),
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

fn detect_zip(data: &[u8]) -> FormatType {
    let mut archive = match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        // Unopenable container: let the package reader report the corruption.
        Err(_) => return FormatType::PackagedXml,
    };

    if let Ok(mut file) = archive.by_name("[Content_Types].xml") {
        let mut bytes = Vec::new();
        if file.read_to_end(&mut bytes).is_ok() {
            if let Ok(content_types) = decode_xml_bytes(&bytes) {
                if content_types.contains(WORDPROCESSING_MARKER) {
                    return FormatType::PackagedXml;
                }
            }
        }
    }

    if archive.file_names().any(|n| n.starts_with("word/")) {
        FormatType::PackagedXml
    } else {
        FormatType::Unknown
    }
}

fn detect_text(data: &[u8]) -> FormatType {
    let probe = &data[..data.len().min(TEXT_PROBE_LEN)];
    let text = match decode_xml_bytes(probe) {
        Ok(text) => text,
        Err(_) => String::from_utf8_lossy(probe).into_owned(),
    };
    let text = text.trim_start_matches('\u{FEFF}').trim_start();
    let lower = text.to_ascii_lowercase();

    if lower.starts_with("{\\rtf") {
        return FormatType::Rtf;
    }
    if is_mhtml_header(&lower) {
        return FormatType::Mhtml;
    }
    if lower.starts_with("<!doctype html")
        || lower.starts_with("<html")
        || (lower.starts_with("<?xml") && lower.contains("<html"))
        || looks_like_html_fragment(&lower)
    {
        return FormatType::Html;
    }
    FormatType::Unknown
}

fn is_mhtml_header(lower: &str) -> bool {
    let header_block = lower.split("\n\n").next().unwrap_or(lower);
    let header_block = header_block.split("\r\n\r\n").next().unwrap_or(header_block);
    header_block.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("mime-version:")
            || (line.starts_with("content-type:") && line.contains("multipart/related"))
    })
}

fn looks_like_html_fragment(lower: &str) -> bool {
    const TAGS: &[&str] = &[
        "<head", "<body", "<p", "<div", "<h1", "<h2", "<h3", "<table", "<ul", "<ol", "<section",
        "<meta",
    ];
    lower.starts_with('<')
        && TAGS.iter().any(|tag| {
            lower.starts_with(tag)
                && lower[tag.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c == '>' || c == ' ' || c == '/')
        })
}
