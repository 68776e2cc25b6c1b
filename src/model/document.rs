//! Document model structures.

use super::{runs_plain_text, ImageBlock, ParagraphStyle, Run, Table};
use crate::detect::FormatType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// List flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
    Task,
}

/// Checkbox glyph prefixed to an open task item in packages.
pub const TASK_UNCHECKED_GLYPH: char = '☐';

/// Checkbox glyph prefixed to a done task item in packages.
pub const TASK_CHECKED_GLYPH: char = '☒';

/// One list item: a block sequence, optionally checked (task lists).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl ListItem {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            checked: None,
        }
    }

    pub fn task(blocks: Vec<Block>, checked: bool) -> Self {
        Self {
            blocks,
            checked: Some(checked),
        }
    }
}

/// A content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        runs: Vec<Run>,
        #[serde(default, skip_serializing_if = "ParagraphStyle::is_empty")]
        style: ParagraphStyle,
    },
    Heading {
        /// 1-6
        level: u8,
        runs: Vec<Run>,
        #[serde(default, skip_serializing_if = "ParagraphStyle::is_empty")]
        style: ParagraphStyle,
    },
    List {
        kind: ListKind,
        /// First number of an ordered list, when not 1
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<u32>,
        items: Vec<ListItem>,
    },
    Blockquote {
        blocks: Vec<Block>,
    },
    Code {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Table(Table),
    Image(ImageBlock),
    PageBreak,
    /// Opaque HTML kept verbatim; also carries letterhead regions.
    RawHtml {
        html: String,
    },
}

impl Block {
    /// Unstyled paragraph.
    pub fn paragraph(runs: Vec<Run>) -> Self {
        Block::Paragraph {
            runs,
            style: ParagraphStyle::default(),
        }
    }

    /// Unstyled heading; the level is clamped to 1-6.
    pub fn heading(level: u8, runs: Vec<Run>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            runs,
            style: ParagraphStyle::default(),
        }
    }

    /// Plain text of the block and its children.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph { runs, .. } | Block::Heading { runs, .. } => runs_plain_text(runs),
            Block::List { items, .. } => items
                .iter()
                .map(|item| blocks_plain_text(&item.blocks))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Blockquote { blocks } => blocks_plain_text(blocks),
            Block::Code { text, .. } => text.clone(),
            Block::Table(table) => table.plain_text(),
            Block::Image(image) => image.alt.clone().unwrap_or_default(),
            Block::PageBreak => String::new(),
            Block::RawHtml { html } => strip_tags(html),
        }
    }

    /// Visit this block and every nested block, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        match self {
            Block::List { items, .. } => {
                for item in items {
                    for block in &item.blocks {
                        block.walk(visit);
                    }
                }
            }
            Block::Blockquote { blocks } => {
                for block in blocks {
                    block.walk(visit);
                }
            }
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        for block in &cell.blocks {
                            block.walk(visit);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Mutable depth-first visit.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Block)) {
        visit(self);
        match self {
            Block::List { items, .. } => {
                for item in items {
                    for block in &mut item.blocks {
                        block.walk_mut(visit);
                    }
                }
            }
            Block::Blockquote { blocks } => {
                for block in blocks {
                    block.walk_mut(visit);
                }
            }
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        for block in &mut cell.blocks {
                            block.walk_mut(visit);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Plain text of a block sequence, one block per line.
pub fn blocks_plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Structural problems noticed while reading a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionFlag {
    MissingStyles,
    MissingDocumentRelationships,
    Utf16Parts,
    UnreadableEntry(String),
    MalformedXml(String),
}

impl std::fmt::Display for CorruptionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptionFlag::MissingStyles => write!(f, "missing styles part"),
            CorruptionFlag::MissingDocumentRelationships => {
                write!(f, "missing document relationships")
            }
            CorruptionFlag::Utf16Parts => write!(f, "UTF-16 encoded parts"),
            CorruptionFlag::UnreadableEntry(name) => write!(f, "unreadable entry {}", name),
            CorruptionFlag::MalformedXml(name) => write!(f, "malformed XML in {}", name),
        }
    }
}

/// Letterhead classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterheadKind {
    Government,
    Party,
    Military,
    Custom,
}

impl LetterheadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterheadKind::Government => "government",
            LetterheadKind::Party => "party",
            LetterheadKind::Military => "military",
            LetterheadKind::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "government" => Some(LetterheadKind::Government),
            "party" => Some(LetterheadKind::Party),
            "military" => Some(LetterheadKind::Military),
            "custom" => Some(LetterheadKind::Custom),
            _ => None,
        }
    }
}

/// Decode diagnostics and provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// The sniffed input format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_format: Option<FormatType>,

    /// Name of the strategy that produced the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Document title from core properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Document author from core properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corruption: Vec<CorruptionFlag>,

    /// Raw zip entry names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub letterhead: Option<LetterheadKind>,

    #[serde(default)]
    pub image_count: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl Metadata {
    /// Provenance of one decode input.
    pub fn for_input(format: FormatType, file_name: Option<&str>, file_size: u64) -> Self {
        Self {
            source_format: Some(format),
            file_name: file_name.map(str::to_string),
            file_size: Some(file_size),
            ..Default::default()
        }
    }

    /// Record a diagnostic. Warnings are never removed.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record several diagnostics in order.
    pub fn extend_warnings<I, S>(&mut self, warnings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings.into_iter().map(Into::into));
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Record a corruption flag once.
    pub fn flag(&mut self, flag: CorruptionFlag) {
        if !self.corruption.contains(&flag) {
            self.corruption.push(flag);
        }
    }
}

/// The canonical document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentModel {
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<Block>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Vec<Block>>,

    /// Footnote bodies by id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub footnotes: BTreeMap<u32, Vec<Block>>,

    /// Endnote bodies by id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endnotes: BTreeMap<u32, Vec<Block>>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    /// Whether the body holds no visible content.
    pub fn is_empty(&self) -> bool {
        !self.blocks.iter().any(|block| match block {
            Block::PageBreak => false,
            Block::Image(_) | Block::Table(_) | Block::RawHtml { .. } => true,
            other => !other.plain_text().trim().is_empty(),
        })
    }

    /// Plain text of the body.
    pub fn plain_text(&self) -> String {
        blocks_plain_text(&self.blocks)
    }

    /// Number of image blocks anywhere in the body, header, footer or notes.
    pub fn count_images(&self) -> usize {
        let mut count = 0;
        let mut visit = |block: &Block| {
            if matches!(block, Block::Image(_)) {
                count += 1;
            }
        };
        for block in self.all_blocks() {
            block.walk(&mut visit);
        }
        count
    }

    /// Body, header, footer and note blocks at the top level.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .chain(self.header.iter().flatten())
            .chain(self.footer.iter().flatten())
            .chain(self.footnotes.values().flatten())
            .chain(self.endnotes.values().flatten())
    }

    /// Apply a visitor to every block, including nested and note blocks.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Block)) {
        let groups = std::iter::once(&mut self.blocks)
            .chain(self.header.iter_mut())
            .chain(self.footer.iter_mut())
            .chain(self.footnotes.values_mut())
            .chain(self.endnotes.values_mut());
        for group in groups {
            for block in group.iter_mut() {
                block.walk_mut(visit);
            }
        }
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert to JSON string (compact).
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
