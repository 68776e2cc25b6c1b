//! Canonical document model.
//!
//! Every decode path ends in a [`DocumentModel`], and the encoder consumes
//! one. The model is format-agnostic: lengths are CSS pixels, colors are
//! `#RRGGBB`, and run formatting is already flattened.

mod document;
mod paragraph;
mod resource;
mod table;

pub use document::*;
pub use paragraph::*;
pub use resource::*;
pub use table::*;
