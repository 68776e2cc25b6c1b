//! Unit, color and font normalization.
//!
//! Every measurement that enters the document model passes through exactly
//! one of the conversions in [`units`], every color through
//! [`normalize_color`]. Font names read from a package are expanded with
//! [`font_fallback_chain`]; the HTML mapper keeps `font-family` values as
//! written.

mod color;
mod font;
mod units;

pub use color::{is_reddish, normalize_color, rgb_components};
pub use font::{east_asian_name, font_fallback_chain, is_cjk_text, primary_family};
pub use units::*;
