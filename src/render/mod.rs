//! Output rendering for decoded documents.
//!
//! HTML output lives in [`crate::html`]; this module renders the model
//! and its diagnostics as JSON.
//!
//! # Example
//!
//! ```no_run
//! use wordloom::render::{summarize, to_json, JsonFormat};
//!
//! let decoded = wordloom::decode_file("document.docx")?;
//! let json = to_json(&decoded.model, JsonFormat::Pretty)?;
//! println!("{} image(s)", summarize(&decoded.model).images);
//! # Ok::<(), wordloom::Error>(())
//! ```

mod json;

pub use json::{
    report_json, summarize, to_json, to_json_default, DecodeReport, JsonFormat, Summary,
};
