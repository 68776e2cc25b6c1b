//! Decode and encode configuration.

use crate::pipeline::StrategyKind;
use serde::{Deserialize, Serialize};

/// Font-size thresholds (in pixels) above which a plain paragraph is
/// promoted to a heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingThresholds {
    pub enabled: bool,
    /// 22pt
    pub h1_px: f64,
    /// 16pt
    pub h2_px: f64,
    /// 14pt
    pub h3_px: f64,
    /// Level-3 promotion also requires bold text.
    pub h3_requires_bold: bool,
    /// Longer paragraphs are body text regardless of size.
    pub max_chars: usize,
    /// A promoted paragraph must also be this many times the body size.
    pub min_body_ratio: f64,
}

impl Default for HeadingThresholds {
    fn default() -> Self {
        Self {
            enabled: true,
            h1_px: 29.33,
            h2_px: 21.33,
            h3_px: 18.67,
            h3_requires_bold: true,
            max_chars: 60,
            min_body_ratio: 1.2,
        }
    }
}

impl HeadingThresholds {
    /// Heading level for a paragraph of the given size, boldness and length.
    ///
    /// `body_px` is the document's default text size; when known, text no
    /// larger than the body by `min_body_ratio` is never promoted.
    pub fn level_for(
        &self,
        size_px: Option<f64>,
        body_px: Option<f64>,
        bold: bool,
        chars: usize,
    ) -> Option<u8> {
        if !self.enabled || chars == 0 || chars > self.max_chars {
            return None;
        }
        let size = size_px?;
        if body_px.is_some_and(|body| size < body * self.min_body_ratio) {
            return None;
        }
        if size >= self.h1_px {
            Some(1)
        } else if size >= self.h2_px {
            Some(2)
        } else if size >= self.h3_px && (bold || !self.h3_requires_bold) {
            Some(3)
        } else {
            None
        }
    }
}

/// Letterhead detection tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterheadOptions {
    pub enabled: bool,
    /// Minimum red channel for a color to count as red.
    pub min_red: u8,
    /// Maximum green and blue channels for a color to count as red.
    pub max_green_blue: u8,
    /// Red text runs required above the rule.
    pub min_red_runs: usize,
    /// Body children scanned for the rule.
    pub max_scan_blocks: usize,
}

impl Default for LetterheadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            min_red: 0xC0,
            max_green_blue: 0x60,
            min_red_runs: 1,
            max_scan_blocks: 40,
        }
    }
}

/// Options for decoding documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Inputs above this size (bytes) try the offloaded attempt first.
    pub large_file_threshold: u64,
    /// Inputs at least this large are expected to contain images.
    pub image_plausible_size: u64,
    /// Run the large-file attempt on a worker thread.
    pub offload_large_files: bool,
    pub headings: HeadingThresholds,
    pub letterhead: LetterheadOptions,
    /// Strategy order; strategies not listed are skipped.
    pub strategies: Vec<StrategyKind>,
    /// Decode the default header and footer parts.
    pub include_header_footer: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            large_file_threshold: 5 * 1024 * 1024,
            image_plausible_size: 200 * 1024,
            offload_large_files: true,
            headings: HeadingThresholds::default(),
            letterhead: LetterheadOptions::default(),
            strategies: StrategyKind::ALL.to_vec(),
            include_header_footer: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size above which inputs are offloaded.
    pub fn with_large_file_threshold(mut self, bytes: u64) -> Self {
        self.large_file_threshold = bytes;
        self
    }

    /// Set the size from which an image-less result is distrusted.
    pub fn with_image_plausible_size(mut self, bytes: u64) -> Self {
        self.image_plausible_size = bytes;
        self
    }

    pub fn with_offload(mut self, offload: bool) -> Self {
        self.offload_large_files = offload;
        self
    }

    pub fn with_headings(mut self, headings: HeadingThresholds) -> Self {
        self.headings = headings;
        self
    }

    pub fn with_letterhead(mut self, letterhead: LetterheadOptions) -> Self {
        self.letterhead = letterhead;
        self
    }

    /// Restrict and order the strategies.
    pub fn with_strategies(mut self, strategies: impl Into<Vec<StrategyKind>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    pub fn with_header_footer(mut self, include: bool) -> Self {
        self.include_header_footer = include;
        self
    }

    /// Load options from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options for encoding packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Default Latin font
    pub font_family: String,
    /// Default East Asian font
    pub east_asian_font: String,
    /// Default size in points
    pub font_size_pt: f64,
    /// Page width in twips (A4)
    pub page_width_twips: i64,
    /// Page height in twips (A4)
    pub page_height_twips: i64,
    pub margin_top_twips: i64,
    pub margin_bottom_twips: i64,
    pub margin_left_twips: i64,
    pub margin_right_twips: i64,
    /// Width for images without intrinsic size, in pixels
    pub default_image_width_px: f64,
    /// Core property title
    pub title: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            font_family: "Times New Roman".to_string(),
            east_asian_font: "SimSun".to_string(),
            font_size_pt: 12.0,
            page_width_twips: 11906,
            page_height_twips: 16838,
            margin_top_twips: 1440,
            margin_bottom_twips: 1440,
            margin_left_twips: 1800,
            margin_right_twips: 1800,
            default_image_width_px: 300.0,
            title: None,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_east_asian_font(mut self, family: impl Into<String>) -> Self {
        self.east_asian_font = family.into();
        self
    }

    pub fn with_font_size(mut self, pt: f64) -> Self {
        self.font_size_pt = pt.max(1.0);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Printable width in pixels; images are scaled down to fit.
    pub fn content_width_px(&self) -> f64 {
        crate::normalize::px_from_twip(
            self.page_width_twips - self.margin_left_twips - self.margin_right_twips,
        )
    }

    /// Load options from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = DecodeOptions::default();
        assert_eq!(opts.large_file_threshold, 5 * 1024 * 1024);
        assert_eq!(opts.strategies.len(), 4);
        assert!(opts.letterhead.enabled);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = DecodeOptions::new()
            .with_large_file_threshold(1024)
            .with_offload(false)
            .with_strategies(vec![StrategyKind::HighFidelity]);
        assert_eq!(opts.large_file_threshold, 1024);
        assert!(!opts.offload_large_files);
        assert_eq!(opts.strategies, vec![StrategyKind::HighFidelity]);
    }

    #[test]
    fn test_partial_json_config() {
        let opts = DecodeOptions::from_json(r#"{"letterhead": {"min_red_runs": 2}}"#).unwrap();
        assert_eq!(opts.letterhead.min_red_runs, 2);
        assert_eq!(opts.letterhead.min_red, 0xC0);
        assert_eq!(opts.image_plausible_size, 200 * 1024);

        let enc = EncodeOptions::from_json(r#"{"font_size_pt": 14}"#).unwrap();
        assert_eq!(enc.font_size_pt, 14.0);
        assert_eq!(enc.font_family, "Times New Roman");
    }

    #[test]
    fn test_heading_thresholds() {
        let h = HeadingThresholds::default();
        assert_eq!(h.level_for(Some(29.33), None, false, 10), Some(1));
        assert_eq!(h.level_for(Some(21.33), None, false, 10), Some(2));
        assert_eq!(h.level_for(Some(18.67), None, true, 10), Some(3));
        assert_eq!(h.level_for(Some(18.67), None, false, 10), None);
        assert_eq!(h.level_for(Some(29.33), None, true, 200), None);
        assert_eq!(h.level_for(None, None, true, 10), None);
    }

    #[test]
    fn test_heading_thresholds_relative_to_body() {
        let h = HeadingThresholds::default();
        // 16pt body text
        let body = Some(21.33);
        assert_eq!(h.level_for(Some(21.33), body, true, 10), None);
        assert_eq!(h.level_for(Some(24.0), body, true, 10), None);
        assert_eq!(h.level_for(Some(29.33), body, false, 10), Some(1));
        // 12pt body text
        assert_eq!(h.level_for(Some(21.33), Some(16.0), false, 10), Some(2));
    }

    #[test]
    fn test_content_width() {
        let enc = EncodeOptions::default();
        assert!((enc.content_width_px() - 553.73).abs() < 0.01);
    }
}
