//! Paragraph, run and inline style models.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a paragraph or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Parse a CSS `text-align` value or an OOXML `w:jc` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" | "centre" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "justify" | "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// CSS keyword.
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// OOXML `w:jc` value.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Line height: a unitless multiple of the font size, or an exact pixel
/// height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum LineHeight {
    Multiple(f64),
    Px(f64),
}

/// Paragraph-level layout. Lengths are CSS pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_left: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_right: Option<f64>,

    /// Negative for a hanging indent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line_indent: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<LineHeight>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after: Option<f64>,
}

impl ParagraphStyle {
    pub fn is_empty(&self) -> bool {
        *self == ParagraphStyle::default()
    }
}

/// Flat, fully merged character formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    /// CSS font-family fallback chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    /// Font size in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    /// Foreground color `#RRGGBB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Background color `#RRGGBB`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strike: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub superscript: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub subscript: bool,

    /// Hyperlink target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl RunStyle {
    /// Whether no formatting is set.
    pub fn is_plain(&self) -> bool {
        *self == RunStyle::default()
    }

    /// Whether any CSS-carried property (font, size, colors) is set.
    pub fn has_css(&self) -> bool {
        self.font_family.is_some()
            || self.font_size.is_some()
            || self.color.is_some()
            || self.background.is_some()
    }
}

/// What a run carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunContent {
    Text { text: String },
    LineBreak,
    FootnoteRef { id: u32 },
    EndnoteRef { id: u32 },
}

/// A span of inline content with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(flatten)]
    pub content: RunContent,

    #[serde(default, skip_serializing_if = "RunStyle::is_plain")]
    pub style: RunStyle,
}

impl Run {
    /// Plain text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::styled(text, RunStyle::default())
    }

    /// Text run with formatting.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            content: RunContent::Text { text: text.into() },
            style,
        }
    }

    pub fn line_break() -> Self {
        Self {
            content: RunContent::LineBreak,
            style: RunStyle::default(),
        }
    }

    pub fn footnote_ref(id: u32) -> Self {
        Self {
            content: RunContent::FootnoteRef { id },
            style: RunStyle::default(),
        }
    }

    pub fn endnote_ref(id: u32) -> Self {
        Self {
            content: RunContent::EndnoteRef { id },
            style: RunStyle::default(),
        }
    }

    /// Literal text, if this is a text run.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Concatenated text of runs; line breaks become `\n`.
pub fn runs_plain_text(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        match &run.content {
            RunContent::Text { text } => out.push_str(text),
            RunContent::LineBreak => out.push('\n'),
            RunContent::FootnoteRef { .. } | RunContent::EndnoteRef { .. } => {}
        }
    }
    out
}

/// Merge adjacent text runs with identical formatting and drop empty ones.
pub fn coalesce_runs(runs: Vec<Run>) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let RunContent::Text { text } = &run.content {
            if text.is_empty() {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if last.style == run.style {
                    if let RunContent::Text { text: prev } = &mut last.content {
                        prev.push_str(text);
                        continue;
                    }
                }
            }
        }
        out.push(run);
    }
    out
}
