//! HTML to model.
//!
//! Accepts the shapes [`super::serialize`] writes and degrades gracefully on
//! arbitrary editor HTML: unknown containers are flattened, inline content
//! outside a block becomes an implicit paragraph, and images inside a
//! paragraph are hoisted to block level.

use super::serialize::LETTERHEAD_ATTR;
use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, DocumentModel, ImageBlock, LineHeight, ListItem, ListKind, Margins,
    ParagraphStyle, Run, RunContent, RunStyle, Table, TableCell, TableRow,
};
use crate::normalize::{normalize_color, parse_css_length};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "template", "noscript", "colgroup",
];

const FLATTENED_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "center", "address", "form", "fieldset", "details", "summary", "dl",
    "dt", "dd", "li", "tbody", "thead", "tfoot", "tr", "td", "th", "caption",
];

/// Parse HTML into a document model.
pub fn from_html(html: &str) -> Result<DocumentModel> {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").map_err(|e| Error::Html(format!("{:?}", e)))?;
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut model = DocumentModel::new();
    let blocks = container_blocks(root, Some(&mut model));
    model.blocks = blocks;
    Ok(model)
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "blockquote" | "pre"
            | "table" | "hr"
    ) || FLATTENED_TAGS.contains(&name)
}

/// Blocks of a container element. At the top level `model` receives the
/// header, footer and note sections.
fn container_blocks(element: ElementRef<'_>, mut model: Option<&mut DocumentModel>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut inline = InlineCollector::default();

    for child in element.children() {
        match child.value() {
            Node::Text(text) => inline.push_text(text, &RunStyle::default()),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.value().name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if !is_block_tag(name) {
                    inline.push_element(el, &RunStyle::default());
                    continue;
                }

                blocks.extend(inline.take_implicit_paragraphs());
                if let Some(top) = model.as_deref_mut() {
                    if take_document_part(el, top) {
                        continue;
                    }
                }
                block_element(el, &mut blocks);
            }
            _ => {}
        }
    }

    blocks.extend(inline.take_implicit_paragraphs());
    blocks
}

/// Header, footer and note sections. Returns whether `el` was consumed.
fn take_document_part(el: ElementRef<'_>, model: &mut DocumentModel) -> bool {
    let attrs = el.value();
    match (attrs.name(), attrs.attr("data-docx-part"), attrs.attr("data-notes")) {
        ("header", Some("header"), _) => {
            model.header = Some(container_blocks(el, None));
            true
        }
        ("footer", Some("footer"), _) => {
            model.footer = Some(container_blocks(el, None));
            true
        }
        ("section", _, Some(kind @ ("footnote" | "endnote"))) => {
            let id_attr = if kind == "footnote" {
                "data-footnote-id"
            } else {
                "data-endnote-id"
            };
            for note in el.children().filter_map(ElementRef::wrap) {
                let Some(id) = note
                    .value()
                    .attr(id_attr)
                    .and_then(|v| v.trim().parse::<u32>().ok())
                else {
                    continue;
                };
                let blocks = container_blocks(note, None);
                if kind == "footnote" {
                    model.footnotes.insert(id, blocks);
                } else {
                    model.endnotes.insert(id, blocks);
                }
            }
            true
        }
        _ => false,
    }
}

fn block_element(el: ElementRef<'_>, out: &mut Vec<Block>) {
    let name = el.value().name();
    match name {
        "p" => {
            let style = paragraph_style(el.value().attr("style"));
            out.extend(explicit_paragraph(el, style, None));
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<u8>().unwrap_or(1);
            let style = paragraph_style(el.value().attr("style"));
            out.extend(explicit_paragraph(el, style, Some(level)));
        }
        "ul" | "ol" => out.push(list_block(el)),
        "blockquote" => out.push(Block::Blockquote {
            blocks: container_blocks(el, None),
        }),
        "pre" => out.push(code_block(el)),
        "table" => out.push(Block::Table(table_block(el))),
        "hr" => {
            let page_break = el.value().attr("data-type") == Some("page-break")
                || el
                    .value()
                    .attr("style")
                    .is_some_and(|s| s.contains("page-break"));
            if page_break {
                out.push(Block::PageBreak);
            } else {
                out.push(Block::RawHtml {
                    html: "<hr>".to_string(),
                });
            }
        }
        "div" if el.value().attr(LETTERHEAD_ATTR).is_some() => {
            out.push(Block::RawHtml { html: el.html() })
        }
        "div" if el.value().attr("data-raw-html").is_some() => out.push(Block::RawHtml {
            html: el.inner_html(),
        }),
        _ => out.extend(container_blocks(el, None)),
    }
}

fn explicit_paragraph(el: ElementRef<'_>, style: ParagraphStyle, level: Option<u8>) -> Vec<Block> {
    let mut inline = InlineCollector::default();
    inline.push_children(el, &RunStyle::default());
    let segments = inline.finish();

    let make = |runs: Vec<Run>, style: ParagraphStyle| match level {
        Some(level) => Block::Heading { level, runs, style },
        None => Block::Paragraph { runs, style },
    };

    if segments.is_empty() {
        return vec![make(Vec::new(), style)];
    }
    if let [Segment::Image(image)] = segments.as_slice() {
        let mut image = image.clone();
        if image.align.is_none() {
            image.align = style.alignment;
        }
        return vec![Block::Image(image)];
    }
    segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Runs(runs) => make(runs, style.clone()),
            Segment::Image(image) => Block::Image(image),
        })
        .collect()
}

fn list_block(el: ElementRef<'_>) -> Block {
    let task = el.value().attr("data-type") == Some("taskList");
    let kind = if task {
        ListKind::Task
    } else if el.value().name() == "ol" {
        ListKind::Ordered
    } else {
        ListKind::Bullet
    };
    let start = match kind {
        ListKind::Ordered => el
            .value()
            .attr("start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|s| *s != 1),
        _ => None,
    };

    let mut items: Vec<ListItem> = Vec::new();
    for child in el.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "li" => {
                let blocks = container_blocks(child, None);
                items.push(if task {
                    ListItem::task(blocks, child.value().attr("data-checked") == Some("true"))
                } else {
                    ListItem::new(blocks)
                });
            }
            "ul" | "ol" => {
                let nested = list_block(child);
                match items.last_mut() {
                    Some(item) => item.blocks.push(nested),
                    None => items.push(ListItem::new(vec![nested])),
                }
            }
            _ => {}
        }
    }

    Block::List { kind, start, items }
}

fn code_block(el: ElementRef<'_>) -> Block {
    let language = el
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code")
        .into_iter()
        .chain(std::iter::once(el))
        .flat_map(|e| e.value().classes().collect::<Vec<_>>())
        .find_map(|class| class.strip_prefix("language-").map(str::to_string))
        .filter(|lang| !lang.is_empty());

    Block::Code {
        text: el.text().collect(),
        language,
    }
}

fn table_block(el: ElementRef<'_>) -> Table {
    let mut table = Table::default();
    for child in el.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "colgroup" => {
                table.column_widths = child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "col")
                    .filter_map(|col| {
                        css_declarations(col.value().attr("style").unwrap_or(""))
                            .into_iter()
                            .find(|(name, _)| name == "width")
                            .and_then(|(_, value)| parse_css_length(&value))
                            .or_else(|| col.value().attr("width").and_then(parse_css_length))
                    })
                    .collect();
            }
            "tr" => table.rows.push(table_row(child)),
            "thead" | "tbody" | "tfoot" => {
                for row in child.children().filter_map(ElementRef::wrap) {
                    if row.value().name() == "tr" {
                        table.rows.push(table_row(row));
                    }
                }
            }
            _ => {}
        }
    }
    table
}

fn table_row(row: ElementRef<'_>) -> TableRow {
    let cells = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .map(|cell| {
            let span = |name: &str| {
                cell.value()
                    .attr(name)
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .unwrap_or(1)
            };
            let background = css_declarations(cell.value().attr("style").unwrap_or(""))
                .into_iter()
                .filter(|(name, _)| name == "background-color" || name == "background")
                .find_map(|(_, value)| normalize_color(&value));
            TableCell {
                blocks: container_blocks(cell, None),
                colspan: 1,
                rowspan: 1,
                header: cell.value().name() == "th",
                background,
            }
            .with_span(span("colspan"), span("rowspan"))
        })
        .collect();
    TableRow::new(cells)
}

fn image_block(el: ElementRef<'_>) -> Option<ImageBlock> {
    let attrs = el.value();
    let src = attrs.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
    let css = css_declarations(attrs.attr("style").unwrap_or(""));
    let css_value = |name: &str| {
        css.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    };

    let dimension = |name: &str| {
        attrs
            .attr(name)
            .and_then(parse_css_length)
            .or_else(|| css_value(name).and_then(parse_css_length))
            .filter(|v| *v > 0.0)
    };

    Some(ImageBlock {
        src: src.to_string(),
        original_src: attrs.attr("data-original-src").map(str::to_string),
        alt: attrs.attr("alt").map(str::to_string).filter(|a| !a.is_empty()),
        width: dimension("width"),
        height: dimension("height"),
        align: attrs.attr("data-align").and_then(Alignment::parse),
        margins: image_margins(&css),
    })
}

fn image_margins(css: &[(String, String)]) -> Option<Margins> {
    let mut margins = Margins::default();
    let mut any = false;
    for (name, value) in css {
        match name.as_str() {
            "margin" => {
                let parts: Vec<f64> = value
                    .split_whitespace()
                    .map(|p| parse_css_length(p).unwrap_or(0.0))
                    .collect();
                let (top, right, bottom, left) = match parts.as_slice() {
                    [all] => (*all, *all, *all, *all),
                    [v, h] => (*v, *h, *v, *h),
                    [t, h, b] => (*t, *h, *b, *h),
                    [t, r, b, l, ..] => (*t, *r, *b, *l),
                    [] => continue,
                };
                margins = Margins {
                    top,
                    right,
                    bottom,
                    left,
                };
                any = true;
            }
            "margin-top" | "margin-right" | "margin-bottom" | "margin-left" => {
                let Some(v) = parse_css_length(value) else {
                    continue;
                };
                match name.as_str() {
                    "margin-top" => margins.top = v,
                    "margin-right" => margins.right = v,
                    "margin-bottom" => margins.bottom = v,
                    _ => margins.left = v,
                }
                any = true;
            }
            _ => {}
        }
    }
    any.then_some(margins)
}

/// Lowercased property names with trimmed values.
fn css_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

fn paragraph_style(style: Option<&str>) -> ParagraphStyle {
    let mut out = ParagraphStyle::default();
    for (name, value) in css_declarations(style.unwrap_or("")) {
        match name.as_str() {
            "text-align" => out.alignment = Alignment::parse(&value),
            "margin-left" => out.indent_left = parse_css_length(&value),
            "margin-right" => out.indent_right = parse_css_length(&value),
            "text-indent" => out.first_line_indent = parse_css_length(&value),
            "line-height" => out.line_height = parse_line_height(&value),
            "margin-top" => out.space_before = parse_css_length(&value),
            "margin-bottom" => out.space_after = parse_css_length(&value),
            _ => {}
        }
    }
    out
}

fn parse_line_height(value: &str) -> Option<LineHeight> {
    let value = value.trim().to_ascii_lowercase();
    if value == "normal" {
        return None;
    }
    if let Some(percent) = value.strip_suffix('%') {
        let pct: f64 = percent.trim().parse().ok()?;
        return Some(LineHeight::Multiple(pct / 100.0));
    }
    if let Ok(multiple) = value.parse::<f64>() {
        return multiple.is_finite().then_some(LineHeight::Multiple(multiple));
    }
    parse_css_length(&value).map(LineHeight::Px)
}

/// A `font-family` value as written, without surrounding whitespace.
fn font_family_value(value: &str) -> Option<String> {
    let family = value.trim();
    (!family.is_empty()).then(|| family.to_string())
}

/// Apply an element's inline CSS to an inherited run style.
fn apply_run_css(style: &mut RunStyle, css: &str) {
    for (name, value) in css_declarations(css) {
        let lower = value.to_ascii_lowercase();
        match name.as_str() {
            "font-family" => {
                if let Some(family) = font_family_value(&value) {
                    style.font_family = Some(family);
                }
            }
            "font-size" => {
                if let Some(px) = parse_css_length(&value) {
                    style.font_size = Some(px);
                }
            }
            "color" => {
                if let Some(color) = normalize_color(&value) {
                    style.color = Some(color);
                }
            }
            "background-color" | "background" => {
                if let Some(color) = normalize_color(&value) {
                    style.background = Some(color);
                }
            }
            "font-weight" => {
                style.bold = match lower.as_str() {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    n => n.parse::<u32>().map(|w| w >= 600).unwrap_or(style.bold),
                }
            }
            "font-style" => style.italic = lower == "italic" || lower == "oblique",
            "text-decoration" | "text-decoration-line" => {
                if lower.contains("none") {
                    style.underline = false;
                    style.strike = false;
                }
                if lower.contains("underline") {
                    style.underline = true;
                }
                if lower.contains("line-through") {
                    style.strike = true;
                }
            }
            "vertical-align" => match lower.as_str() {
                "super" => {
                    style.superscript = true;
                    style.subscript = false;
                }
                "sub" => {
                    style.subscript = true;
                    style.superscript = false;
                }
                "baseline" => {
                    style.superscript = false;
                    style.subscript = false;
                }
                _ => {}
            },
            _ => {}
        }
    }
}

enum Segment {
    Runs(Vec<Run>),
    Image(ImageBlock),
}

/// Accumulates inline content. Whitespace containing a line break is a
/// soft space: dropped at the edges, a single space between content.
#[derive(Default)]
struct InlineCollector {
    segments: Vec<Segment>,
    runs: Vec<Run>,
    soft_space: bool,
}

impl InlineCollector {
    fn push_children(&mut self, el: ElementRef<'_>, style: &RunStyle) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, style),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.push_element(child, style);
                    }
                }
                _ => {}
            }
        }
    }

    fn push_element(&mut self, el: ElementRef<'_>, inherited: &RunStyle) {
        let attrs = el.value();
        let name = attrs.name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }

        if let Some(id) = attrs
            .attr("data-footnote-id")
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.push_run(Run::footnote_ref(id));
            return;
        }
        if let Some(id) = attrs
            .attr("data-endnote-id")
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.push_run(Run::endnote_ref(id));
            return;
        }

        match name {
            "br" => {
                self.soft_space = false;
                self.runs.push(Run::line_break());
                return;
            }
            "img" => {
                if let Some(image) = image_block(el) {
                    self.flush_runs();
                    self.soft_space = false;
                    self.segments.push(Segment::Image(image));
                }
                return;
            }
            _ => {}
        }

        let mut style = inherited.clone();
        match name {
            "strong" | "b" => style.bold = true,
            "em" | "i" => style.italic = true,
            "u" | "ins" => style.underline = true,
            "s" | "strike" | "del" => style.strike = true,
            "sup" => {
                style.superscript = true;
                style.subscript = false;
            }
            "sub" => {
                style.subscript = true;
                style.superscript = false;
            }
            "a" => {
                if let Some(href) = attrs.attr("href").filter(|h| !h.trim().is_empty()) {
                    style.link = Some(href.trim().to_string());
                }
            }
            "mark" => style.background = Some("#FFFF00".to_string()),
            "font" => {
                if let Some(color) = attrs.attr("color").and_then(normalize_color) {
                    style.color = Some(color);
                }
                if let Some(family) = attrs.attr("face").and_then(font_family_value) {
                    style.font_family = Some(family);
                }
            }
            _ => {}
        }
        if let Some(css) = attrs.attr("style") {
            apply_run_css(&mut style, css);
        }

        self.push_children(el, &style);
    }

    /// One text node becomes one run. Line breaks in the source collapse
    /// to a single space between words.
    fn push_text(&mut self, text: &str, style: &RunStyle) {
        let mut buf = String::new();
        let mut pending = false;
        let mut rest = text;
        while !rest.is_empty() {
            let ws = rest
                .find(|c: char| !c.is_ascii_whitespace())
                .unwrap_or(rest.len());
            let (piece, soft) = if ws > 0 {
                let gap = &rest[..ws];
                rest = &rest[ws..];
                if gap.contains(['\n', '\r']) {
                    if buf.is_empty() {
                        self.soft_space = true;
                    } else {
                        pending = true;
                    }
                    continue;
                }
                (gap, false)
            } else {
                let word = rest
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(rest.len());
                let piece = &rest[..word];
                rest = &rest[word..];
                (piece, std::mem::take(&mut pending))
            };
            if buf.is_empty() {
                if self.take_soft_space() {
                    buf.push(' ');
                }
            } else if soft {
                buf.push(' ');
            }
            buf.push_str(piece);
        }
        if !buf.is_empty() {
            self.runs.push(Run::styled(buf, style.clone()));
        }
        if pending {
            self.soft_space = true;
        }
    }

    fn push_run(&mut self, run: Run) {
        if self.take_soft_space() {
            self.runs.push(Run::text(" "));
        }
        self.runs.push(run);
    }

    /// Whether a collapsed line break is owed before the next content.
    fn take_soft_space(&mut self) -> bool {
        std::mem::take(&mut self.soft_space)
            && self
                .runs
                .last()
                .is_some_and(|run| !matches!(run.content, RunContent::LineBreak))
    }

    fn flush_runs(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        if !runs.is_empty() {
            self.segments.push(Segment::Runs(runs));
        }
    }

    fn finish(&mut self) -> Vec<Segment> {
        self.flush_runs();
        self.soft_space = false;
        std::mem::take(&mut self.segments)
    }

    /// Blocks for inline content found directly in a container. Whitespace
    /// alone does not make a paragraph.
    fn take_implicit_paragraphs(&mut self) -> Vec<Block> {
        self.finish()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Image(image) => Some(Block::Image(image)),
                Segment::Runs(runs) => {
                    let meaningful = runs.iter().any(|run| match &run.content {
                        RunContent::Text { text } => !text.trim().is_empty(),
                        _ => true,
                    });
                    meaningful.then(|| Block::paragraph(runs))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(html: &str) -> Vec<Block> {
        from_html(html).unwrap().blocks
    }

    #[test]
    fn test_paragraph_with_inline_formatting() {
        let blocks = body(
            r#"<p style="text-align: center; margin-bottom: 8px">Hello <strong>bold <em>both</em></strong> <span style="color: red; font-size: 12pt">red</span></p>"#,
        );
        assert_eq!(blocks.len(), 1);
        let Block::Paragraph { runs, style } = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks[0]);
        };
        assert_eq!(style.alignment, Some(Alignment::Center));
        assert_eq!(style.space_after, Some(8.0));
        assert_eq!(runs[0].as_text(), Some("Hello "));
        assert!(runs[1].style.bold && !runs[1].style.italic);
        assert!(runs[2].style.bold && runs[2].style.italic);
        assert_eq!(runs.last().unwrap().style.color.as_deref(), Some("#FF0000"));
        assert_eq!(runs.last().unwrap().style.font_size, Some(16.0));
    }

    #[test]
    fn test_soft_whitespace_collapses() {
        let blocks = body("<p>\n  one\n  two<br>\n  three\n</p>");
        let Block::Paragraph { runs, .. } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            runs,
            &vec![Run::text("one two"), Run::line_break(), Run::text("three")]
        );
    }

    #[test]
    fn test_implicit_paragraphs_and_hoisted_images() {
        let blocks = body(
            r#"loose text<p style="text-align: right"><img src="a.png" width="10"></p><div>in div</div>  "#,
        );
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::paragraph(vec![Run::text("loose text")]));
        let Block::Image(image) = &blocks[1] else {
            panic!("expected image");
        };
        assert_eq!(image.align, Some(Alignment::Right));
        assert_eq!(image.width, Some(10.0));
        assert_eq!(blocks[2], Block::paragraph(vec![Run::text("in div")]));
    }

    #[test]
    fn test_image_split_keeps_text_paragraphs() {
        let blocks = body(r#"<p>before<img src="x.png">after</p>"#);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], Block::Image(_)));
        assert_eq!(blocks[2], Block::paragraph(vec![Run::text("after")]));
    }

    #[test]
    fn test_lists_with_misnested_children() {
        let blocks = body(
            r#"<ol start="3"><li>a</li><ul><li>nested</li></ul></ol><ul data-type="taskList"><li data-type="taskItem" data-checked="true"><p>done</p></li></ul>"#,
        );
        let Block::List { kind, start, items } = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(*kind, ListKind::Ordered);
        assert_eq!(*start, Some(3));
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0].blocks[1], Block::List { kind: ListKind::Bullet, .. }));

        let Block::List { kind, items, .. } = &blocks[1] else {
            panic!("expected task list");
        };
        assert_eq!(*kind, ListKind::Task);
        assert_eq!(items[0].checked, Some(true));
    }

    #[test]
    fn test_table_spans_and_widths() {
        let blocks = body(
            r#"<table><colgroup><col style="width: 120px"><col width="30"></colgroup><tr><th colspan="2" style="background: #ff0">H</th></tr><tr><td rowspan="2">a</td><td></td></tr></table>"#,
        );
        let Block::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.column_widths, vec![120.0, 30.0]);
        assert_eq!(table.rows.len(), 2);
        let head = &table.rows[0].cells[0];
        assert!(head.header);
        assert_eq!(head.colspan, 2);
        assert_eq!(head.background.as_deref(), Some("#FFFF00"));
        assert_eq!(table.rows[1].cells[0].rowspan, 2);
        assert!(table.rows[1].cells[1].blocks.is_empty());
    }

    #[test]
    fn test_code_block_language() {
        let blocks = body("<pre><code class=\"language-rust\">fn main() {}\n</code></pre>");
        assert_eq!(
            blocks[0],
            Block::Code {
                text: "fn main() {}\n".to_string(),
                language: Some("rust".to_string())
            }
        );
    }

    #[test]
    fn test_document_parts_and_notes() {
        let model = from_html(
            r#"<header data-docx-part="header"><p>H</p></header><p>See<sup class="footnote-ref" data-footnote-id="2">2</sup></p><section data-notes="footnote"><div data-footnote-id="2"><p>Note</p></div></section>"#,
        )
        .unwrap();
        assert_eq!(model.header, Some(vec![Block::paragraph(vec![Run::text("H")])]));
        assert_eq!(
            model.blocks,
            vec![Block::paragraph(vec![Run::text("See"), Run::footnote_ref(2)])]
        );
        assert_eq!(
            model.footnotes.get(&2),
            Some(&vec![Block::paragraph(vec![Run::text("Note")])])
        );
    }

    #[test]
    fn test_raw_html_and_page_break() {
        let blocks = body(
            r#"<hr data-type="page-break"><div data-raw-html="true"><b>x</b></div><script>alert(1)</script>"#,
        );
        assert_eq!(
            blocks,
            vec![
                Block::PageBreak,
                Block::RawHtml {
                    html: "<b>x</b>".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_line_height_forms() {
        assert_eq!(parse_line_height("1.5"), Some(LineHeight::Multiple(1.5)));
        assert_eq!(parse_line_height("150%"), Some(LineHeight::Multiple(1.5)));
        assert_eq!(parse_line_height("18pt"), Some(LineHeight::Px(24.0)));
        assert_eq!(parse_line_height("normal"), None);
    }

    #[test]
    fn test_font_family_kept_as_written() {
        let blocks = body(
            r#"<p><span style="font-family: SimSun">a</span><font face="Arial">b</font></p>"#,
        );
        let Block::Paragraph { runs, .. } = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(runs[0].style.font_family.as_deref(), Some("SimSun"));
        assert_eq!(runs[1].style.font_family.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_adjacent_spans_stay_separate_runs() {
        let blocks = body(
            r#"<p><span style="color: #C00000"> </span><span style="color: #C00000">a  b</span></p>"#,
        );
        let Block::Paragraph { runs, .. } = &blocks[0] else {
            panic!("expected paragraph");
        };
        let texts: Vec<_> = runs.iter().filter_map(Run::as_text).collect();
        assert_eq!(texts, vec![" ", "a  b"]);
    }

    #[test]
    fn test_empty_paragraph_survives() {
        assert_eq!(body("<p></p>"), vec![Block::paragraph(Vec::new())]);
    }
}
