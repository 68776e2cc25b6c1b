//! Word-processing package decoding.
//!
//! [`DocxPackage`] loads and validates a package, [`Converter`] turns its
//! trees into canonical blocks, which render to the intermediate HTML the
//! decode strategies validate.

mod convert;
mod images;
mod notes;
mod package;
pub mod numbering;
pub mod styles;

pub use convert::{block_children, ConvertMode, Converted, Converter};
pub use images::{extract_image, is_image_carrier};
pub use numbering::NumberingMap;
pub use package::{DocxPackage, MediaRef, Part};
pub use styles::{MergedProperties, ParagraphProps, RunProps, Style, StyleMap};
