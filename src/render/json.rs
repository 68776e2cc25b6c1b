//! JSON renderer implementation.

use crate::error::Result;
use crate::model::{Block, CorruptionFlag, DocumentModel, LetterheadKind};
use serde::Serialize;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

fn write<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(value)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
    };
    Ok(json)
}

/// Convert a model to JSON.
pub fn to_json(model: &DocumentModel, format: JsonFormat) -> Result<String> {
    write(model, format)
}

/// Convert a model to JSON with default formatting.
pub fn to_json_default(model: &DocumentModel) -> Result<String> {
    to_json(model, JsonFormat::Pretty)
}

/// Decode result as one JSON document: the HTML next to the model.
#[derive(Debug, Serialize)]
pub struct DecodeReport<'a> {
    pub html: &'a str,
    pub model: &'a DocumentModel,
}

/// Serialize HTML and model together.
pub fn report_json(html: &str, model: &DocumentModel, format: JsonFormat) -> Result<String> {
    write(&DecodeReport { html, model }, format)
}

/// Counts and diagnostics for a decoded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub blocks: usize,
    pub headings: usize,
    pub tables: usize,
    pub images: usize,
    pub footnotes: usize,
    pub endnotes: usize,
    pub has_header: bool,
    pub has_footer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letterhead: Option<LetterheadKind>,
    pub corruption: Vec<CorruptionFlag>,
    pub warnings: Vec<String>,
}

/// Summarize a model for the `info` view.
pub fn summarize(model: &DocumentModel) -> Summary {
    let mut headings = 0;
    let mut tables = 0;
    let mut count = |block: &Block| match block {
        Block::Heading { .. } => headings += 1,
        Block::Table(_) => tables += 1,
        _ => {}
    };
    for block in &model.blocks {
        block.walk(&mut count);
    }

    let metadata = &model.metadata;
    Summary {
        format: metadata.source_format.map(|f| f.name().to_string()),
        method: metadata.method.clone(),
        title: metadata.title.clone(),
        blocks: model.blocks.len(),
        headings,
        tables,
        images: model.count_images(),
        footnotes: model.footnotes.len(),
        endnotes: model.endnotes.len(),
        has_header: model.header.is_some(),
        has_footer: model.footer.is_some(),
        letterhead: metadata.letterhead,
        corruption: metadata.corruption.clone(),
        warnings: metadata.warnings().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListItem, ListKind, Run, Table, TableCell, TableRow};

    fn sample() -> DocumentModel {
        let mut model = DocumentModel::with_blocks(vec![
            Block::heading(1, vec![Run::text("Title")]),
            Block::paragraph(vec![Run::text("Hello"), Run::footnote_ref(1)]),
            Block::List {
                kind: ListKind::Bullet,
                start: None,
                items: vec![ListItem::new(vec![Block::heading(2, vec![Run::text("Nested")])])],
            },
            Block::Table(Table::new(vec![TableRow::new(vec![TableCell::new(vec![
                Block::paragraph(vec![Run::text("cell")]),
            ])])])),
        ]);
        model.footnotes.insert(1, vec![Block::paragraph(vec![Run::text("note")])]);
        model.metadata.title = Some("Test".to_string());
        model
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"type\": \"heading\""));
        assert!(json.contains("\"text\": \"Hello\""));
        assert!(json.contains("\"title\": \"Test\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"kind\":\"footnote_ref\""));
    }

    #[test]
    fn test_model_roundtrip() {
        let model = sample();
        let json = to_json_default(&model).unwrap();
        let back: DocumentModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_report_carries_html() {
        let json = report_json("<p>Hello</p>", &sample(), JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["html"], "<p>Hello</p>");
        assert_eq!(value["model"]["blocks"][0]["level"], 1);
    }

    #[test]
    fn test_summary_counts_nested_blocks() {
        let summary = summarize(&sample());
        assert_eq!(summary.blocks, 4);
        assert_eq!(summary.headings, 2);
        assert_eq!(summary.tables, 1);
        assert_eq!(summary.footnotes, 1);
        assert_eq!(summary.images, 0);
        assert!(!summary.has_header);
    }
}
