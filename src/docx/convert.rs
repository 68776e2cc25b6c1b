//! Conversion of WordprocessingML trees into canonical blocks.
//!
//! A single pass walks paragraphs, runs, tables and drawings. Paragraph and
//! run formatting is resolved through the style chain and compared against
//! a base style: body paragraphs against the default paragraph style,
//! structural paragraphs (headings, list items, quotes, code) against their
//! own style. Only the differences become inline formatting, so the styles
//! an editor renders by itself are not repeated on every run.

use super::images::{extract_image, is_image_carrier};
use super::notes;
use super::package::{DocxPackage, Part};
use super::styles::{ParagraphProps, RunProps};
use crate::error::{Error, Result};
use crate::model::{
    coalesce_runs, runs_plain_text, Alignment, Block, DocumentModel, ImageBlock, LineHeight,
    ListItem, ListKind, ParagraphStyle, Run, RunContent, RunStyle, Table, TableCell, TableRow,
    TASK_CHECKED_GLYPH, TASK_UNCHECKED_GLYPH,
};
use crate::normalize::{
    font_fallback_chain, is_cjk_text, normalize_color, px_from_half_points, px_from_twip, round2,
};
use crate::options::HeadingThresholds;
use crate::xml::{Tag, XmlElement};
use std::collections::{BTreeMap, HashSet};

/// How much formatting the converter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertMode {
    /// Structure only: headings, lists, tables, images, links, notes and
    /// the emphasis toggles. No CSS-carried formatting.
    Semantic,
    /// Full style-resolved formatting.
    Styled,
}

/// Result of converting a package.
#[derive(Debug, Clone, Default)]
pub struct Converted {
    pub blocks: Vec<Block>,
    pub header: Option<Vec<Block>>,
    pub footer: Option<Vec<Block>>,
    pub footnotes: BTreeMap<u32, Vec<Block>>,
    pub endnotes: BTreeMap<u32, Vec<Block>>,
    pub warnings: Vec<String>,
}

impl Converted {
    /// Assemble a model; metadata is left for the caller.
    pub fn into_model(self) -> (DocumentModel, Vec<String>) {
        let model = DocumentModel {
            blocks: self.blocks,
            header: self.header,
            footer: self.footer,
            footnotes: self.footnotes,
            endnotes: self.endnotes,
            ..Default::default()
        };
        (model, self.warnings)
    }
}

/// Converts the trees of one package.
pub struct Converter<'a> {
    pkg: &'a DocxPackage,
    mode: ConvertMode,
    headings: &'a HeadingThresholds,
    /// Run properties of default body text
    body: RunProps,
    warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Role {
    Body,
    Heading(u8),
    ListItem { num_id: String, level: u8 },
    Code,
    Quote,
}

enum Segment {
    Runs(Vec<Run>),
    Block(Block),
}

#[derive(Default)]
struct FieldFrame {
    instr: String,
    separated: bool,
}

/// Per-paragraph inline accumulation.
struct Inline {
    paragraph_style: Option<String>,
    segments: Vec<Segment>,
    fields: Vec<FieldFrame>,
    max_size: Option<f64>,
    all_bold: bool,
    chars: usize,
    cjk: bool,
}

impl Inline {
    fn push_run(&mut self, run: Run) {
        match self.segments.last_mut() {
            Some(Segment::Runs(runs)) => runs.push(run),
            _ => self.segments.push(Segment::Runs(vec![run])),
        }
    }

    fn push_block(&mut self, block: Block) {
        self.segments.push(Segment::Block(block));
    }

    /// Inside a complex field's instruction area.
    fn in_field_code(&self) -> bool {
        self.fields.last().is_some_and(|f| !f.separated)
    }

    fn field_link(&self) -> Option<String> {
        self.fields
            .iter()
            .rev()
            .filter(|f| f.separated)
            .find_map(|f| hyperlink_from_instr(&f.instr))
    }

    fn note_text(&mut self, resolved: &RunProps, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.chars += text.chars().count();
        let cjk = is_cjk_text(text);
        self.cjk |= cjk;
        let size = resolved
            .size_for(cjk)
            .map(px_from_half_points);
        if let Some(size) = size {
            self.max_size = Some(self.max_size.map_or(size, |m: f64| m.max(size)));
        }
        self.all_bold &= resolved.bold == Some(true);
    }
}

struct ParagraphOut {
    role: Role,
    style: ParagraphStyle,
    segments: Vec<Segment>,
    page_break_before: bool,
    max_size: Option<f64>,
    all_bold: bool,
    chars: usize,
    cjk: bool,
}

struct ListEntry {
    num_id: String,
    level: u8,
    kind: ListKind,
    start: u32,
    blocks: Vec<Block>,
}

enum Pending {
    None,
    List(Vec<ListEntry>),
    Code(Vec<String>),
    Quote(Vec<Block>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Merge {
    None,
    Restart,
    Continue,
}

struct RawCell<'x> {
    col: usize,
    span: usize,
    merge: Merge,
    element: &'x XmlElement,
}

impl<'a> Converter<'a> {
    pub fn new(pkg: &'a DocxPackage, mode: ConvertMode, headings: &'a HeadingThresholds) -> Self {
        Self {
            pkg,
            mode,
            headings,
            body: pkg.styles.resolve_paragraph(None).run,
            warnings: Vec::new(),
        }
    }

    /// Convert the whole package.
    pub fn convert(mut self, include_header_footer: bool) -> Result<Converted> {
        let pkg = self.pkg;
        let body = pkg
            .body()
            .ok_or_else(|| Error::XmlParse("main document body did not parse".to_string()))?;
        let blocks = self.convert_elements(&pkg.main, &block_children(body));
        Ok(self.finish(blocks, include_header_footer))
    }

    /// Attach header, footer and notes to already converted body blocks.
    pub fn finish(mut self, blocks: Vec<Block>, include_header_footer: bool) -> Converted {
        let pkg = self.pkg;
        let (header, footer) = if include_header_footer {
            (
                pkg.header.as_ref().and_then(|p| self.convert_part_root(p)),
                pkg.footer.as_ref().and_then(|p| self.convert_part_root(p)),
            )
        } else {
            (None, None)
        };
        let footnotes = pkg
            .footnotes
            .as_ref()
            .map(|p| self.convert_notes(p))
            .unwrap_or_default();
        let endnotes = pkg
            .endnotes
            .as_ref()
            .map(|p| self.convert_notes(p))
            .unwrap_or_default();

        Converted {
            blocks,
            header,
            footer,
            footnotes,
            endnotes,
            warnings: self.warnings,
        }
    }

    /// Convert a run of block-level elements (paragraphs and tables).
    pub fn convert_elements(&mut self, part: &Part, elements: &[&XmlElement]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = Pending::None;

        for element in elements {
            match element.tag {
                Tag::Paragraph => {
                    let para = self.convert_paragraph(part, element);
                    self.place_paragraph(para, &mut pending, &mut blocks);
                }
                Tag::Table => {
                    flush(&mut pending, &mut blocks);
                    let table = self.convert_table(part, element);
                    if !table.is_empty() {
                        blocks.push(Block::Table(table));
                    }
                }
                _ => {}
            }
        }
        flush(&mut pending, &mut blocks);
        blocks
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    fn convert_part_root(&mut self, part: &Part) -> Option<Vec<Block>> {
        let root = part.tree.as_ref()?;
        let blocks = self.convert_elements(part, &block_children(root));
        (!is_blank(&blocks)).then_some(blocks)
    }

    fn convert_notes(&mut self, part: &Part) -> BTreeMap<u32, Vec<Block>> {
        let mut out = BTreeMap::new();
        let Some(root) = part.tree.as_ref() else {
            return out;
        };
        for note in notes::note_bodies(root) {
            let mut blocks = self.convert_elements(part, &note.elements);
            notes::trim_leading_space(&mut blocks);
            out.insert(note.id, blocks);
        }
        out
    }

    fn place_paragraph(&mut self, para: ParagraphOut, pending: &mut Pending, blocks: &mut Vec<Block>) {
        if para.page_break_before {
            flush(pending, blocks);
            blocks.push(Block::PageBreak);
        }

        match para.role {
            Role::ListItem { num_id, level } => {
                let numbering = &self.pkg.numbering;
                let entry = ListEntry {
                    kind: numbering.list_kind(&num_id, level),
                    start: numbering.start(&num_id, level),
                    num_id,
                    level,
                    blocks: paragraph_blocks(None, para.style, para.segments),
                };
                match pending {
                    Pending::List(entries) => entries.push(entry),
                    _ => {
                        flush(pending, blocks);
                        *pending = Pending::List(vec![entry]);
                    }
                }
            }
            Role::Code => {
                let line = para
                    .segments
                    .iter()
                    .filter_map(|s| match s {
                        Segment::Runs(runs) => Some(runs_plain_text(runs)),
                        Segment::Block(_) => None,
                    })
                    .collect::<String>();
                match pending {
                    Pending::Code(lines) => lines.push(line),
                    _ => {
                        flush(pending, blocks);
                        *pending = Pending::Code(vec![line]);
                    }
                }
            }
            Role::Quote => {
                let quoted = paragraph_blocks(None, para.style, para.segments);
                match pending {
                    Pending::Quote(inner) => inner.extend(quoted),
                    _ => {
                        flush(pending, blocks);
                        *pending = Pending::Quote(quoted);
                    }
                }
            }
            Role::Heading(level) => {
                flush(pending, blocks);
                blocks.extend(paragraph_blocks(Some(level), para.style, para.segments));
            }
            Role::Body => {
                flush(pending, blocks);
                let promoted = match self.mode {
                    ConvertMode::Styled => {
                        let body = self.body.size_for(para.cjk).map(px_from_half_points);
                        self.headings
                            .level_for(para.max_size, body, para.all_bold, para.chars)
                    }
                    ConvertMode::Semantic => None,
                };
                blocks.extend(paragraph_blocks(promoted, para.style, para.segments));
            }
        }
    }

    fn convert_paragraph(&mut self, part: &Part, p: &XmlElement) -> ParagraphOut {
        let ppr = p.child(Tag::ParagraphProps);
        let direct = ppr.map(ParagraphProps::from_element).unwrap_or_default();
        let style_id = direct.style_id.clone();
        let pkg = self.pkg;
        let styles = &pkg.styles;

        let mut merged = styles.resolve_paragraph(style_id.as_deref()).paragraph;
        merged.merge(&direct);
        let role = self.paragraph_role(style_id.as_deref(), &merged);

        let mut inline = Inline {
            paragraph_style: style_id,
            segments: Vec::new(),
            fields: Vec::new(),
            max_size: None,
            all_bold: true,
            chars: 0,
            cjk: false,
        };
        self.collect_inline(part, p, &mut inline, None);

        let style = match self.mode {
            ConvertMode::Styled => paragraph_style(&merged),
            ConvertMode::Semantic => ParagraphStyle::default(),
        };
        let page_break_before = ppr
            .and_then(|ppr| ppr.child_named("w:pageBreakBefore"))
            .is_some_and(XmlElement::on_off);

        ParagraphOut {
            role,
            style,
            segments: inline.segments,
            page_break_before,
            max_size: inline.max_size,
            all_bold: inline.all_bold && inline.chars > 0,
            chars: inline.chars,
            cjk: inline.cjk,
        }
    }

    fn paragraph_role(&self, style_id: Option<&str>, merged: &ParagraphProps) -> Role {
        let styles = &self.pkg.styles;
        if let Some(id) = style_id {
            if let Some(level) = styles.heading_level(id) {
                return Role::Heading(level);
            }
        }
        if let Some((num_id, level)) = &merged.numbering {
            if self.pkg.numbering.is_numbered(num_id) {
                return Role::ListItem {
                    num_id: num_id.clone(),
                    level: *level,
                };
            }
        }
        if let Some(id) = style_id {
            let name = styles
                .style_name(id)
                .unwrap_or(id)
                .to_ascii_lowercase()
                .replace([' ', '-', '_'], "");
            if is_code_style(&name) || is_code_style(&id.to_ascii_lowercase()) {
                return Role::Code;
            }
            if is_quote_style(&name) || is_quote_style(&id.to_ascii_lowercase()) {
                return Role::Quote;
            }
        }
        match merged.outline_level {
            Some(level) if level < 6 => Role::Heading(level + 1),
            _ => Role::Body,
        }
    }

    fn collect_inline(
        &mut self,
        part: &Part,
        element: &XmlElement,
        inline: &mut Inline,
        link: Option<&str>,
    ) {
        for child in element.elements() {
            match child.tag {
                Tag::Run => self.convert_run(part, child, inline, link),
                Tag::Hyperlink => {
                    let target = child
                        .attr("r:id")
                        .and_then(|id| self.pkg.hyperlink_target(part, id))
                        .map(str::to_string)
                        .or_else(|| child.attr("w:anchor").map(|a| format!("#{}", a)));
                    self.collect_inline(part, child, inline, target.as_deref().or(link));
                }
                Tag::FieldSimple => {
                    let target = child.attr("w:instr").and_then(hyperlink_from_instr);
                    self.collect_inline(part, child, inline, target.as_deref().or(link));
                }
                Tag::Transparent => self.collect_inline(part, child, inline, link),
                Tag::AlternateContent => {
                    if let Some(branch) = child
                        .child(Tag::Choice)
                        .or_else(|| child.child(Tag::Fallback))
                    {
                        self.collect_inline(part, branch, inline, link);
                    }
                }
                _ => {}
            }
        }
    }

    fn convert_run(&mut self, part: &Part, run: &XmlElement, inline: &mut Inline, link: Option<&str>) {
        let pkg = self.pkg;
        let styles = &pkg.styles;
        let direct = run
            .child(Tag::RunProps)
            .map(RunProps::from_element)
            .unwrap_or_default();
        let resolved = styles.resolve_run(inline.paragraph_style.as_deref(), &direct);
        let link = link.map(str::to_string).or_else(|| inline.field_link());

        for child in run.elements() {
            match child.tag {
                Tag::FieldChar => match child.attr("w:fldCharType") {
                    Some("begin") => inline.fields.push(FieldFrame::default()),
                    Some("separate") => {
                        if let Some(frame) = inline.fields.last_mut() {
                            frame.separated = true;
                        }
                    }
                    Some("end") => {
                        inline.fields.pop();
                    }
                    _ => {}
                },
                Tag::InstrText => {
                    if let Some(frame) = inline.fields.last_mut() {
                        if !frame.separated {
                            frame.instr.push_str(&child.text_content());
                        }
                    }
                }
                _ if inline.in_field_code() => {}
                Tag::Text | Tag::Tab => {
                    let text = match child.tag {
                        Tag::Tab => "\t".to_string(),
                        _ => child.text_content(),
                    };
                    if text.is_empty() {
                        continue;
                    }
                    let style = self.run_style(&resolved, &text, link.as_deref());
                    inline.note_text(&resolved, &text);
                    inline.push_run(Run::styled(text, style));
                }
                Tag::Break => match child.attr("w:type") {
                    Some("page") => inline.push_block(Block::PageBreak),
                    Some("column") => {}
                    _ => inline.push_run(Run::line_break()),
                },
                Tag::CarriageReturn => inline.push_run(Run::line_break()),
                Tag::FootnoteReference => {
                    if let Some(id) = note_id(child) {
                        inline.push_run(Run::footnote_ref(id));
                    }
                }
                Tag::EndnoteReference => {
                    if let Some(id) = note_id(child) {
                        inline.push_run(Run::endnote_ref(id));
                    }
                }
                Tag::Drawing | Tag::Pict | Tag::Object => {
                    if let Some(image) = self.image(part, child) {
                        inline.push_block(Block::Image(image));
                    }
                }
                Tag::AlternateContent => {
                    let branches = [child.child(Tag::Choice), child.child(Tag::Fallback)];
                    for branch in branches.into_iter().flatten() {
                        if let Some(image) = first_carrier(branch).and_then(|c| self.image(part, c)) {
                            inline.push_block(Block::Image(image));
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn image(&mut self, part: &Part, carrier: &XmlElement) -> Option<ImageBlock> {
        match extract_image(self.pkg, part, carrier) {
            Ok(Some(mut image)) => {
                if self.mode == ConvertMode::Semantic {
                    image.align = None;
                    image.margins = None;
                }
                Some(image)
            }
            Ok(None) => None,
            Err(e) => {
                self.warn(format!("image skipped: {}", e));
                None
            }
        }
    }

    /// The flat run style: every property the style chain resolves to.
    fn run_style(&self, resolved: &RunProps, text: &str, link: Option<&str>) -> RunStyle {
        let on = |value: Option<bool>| value == Some(true);
        let mut style = RunStyle {
            bold: on(resolved.bold),
            italic: on(resolved.italic),
            underline: on(resolved.underline),
            strike: on(resolved.strike),
            link: link.map(str::to_string),
            ..Default::default()
        };
        match resolved.vert_align.as_deref() {
            Some("superscript") => style.superscript = true,
            Some("subscript") => style.subscript = true,
            _ => {}
        }

        if self.mode == ConvertMode::Semantic {
            return style;
        }

        let cjk = is_cjk_text(text);
        style.font_family = resolved
            .font_for(cjk)
            .map(font_fallback_chain)
            .filter(|chain| !chain.is_empty());
        style.font_size = resolved.size_for(cjk).map(px_from_half_points);
        style.color = resolved.color.as_deref().and_then(normalize_color);
        style.background = resolved
            .highlight
            .as_deref()
            .or(resolved.shading.as_deref())
            .and_then(normalize_color);
        style
    }

    fn convert_table(&mut self, part: &Part, tbl: &XmlElement) -> Table {
        let column_widths = match self.mode {
            ConvertMode::Styled => tbl
                .child(Tag::TableGrid)
                .map(|grid| {
                    grid.elements()
                        .filter(|c| c.tag == Tag::GridCol)
                        .filter_map(|c| c.attr("w:w")?.parse::<i64>().ok())
                        .map(px_from_twip)
                        .collect()
                })
                .unwrap_or_default(),
            ConvertMode::Semantic => Vec::new(),
        };

        let rows: Vec<&XmlElement> = block_children(tbl)
            .into_iter()
            .filter(|e| e.tag == Tag::Row)
            .collect();

        // Grid positions and vertical merge state per cell.
        let mut layout: Vec<Vec<RawCell>> = Vec::with_capacity(rows.len());
        let mut active: HashSet<usize> = HashSet::new();
        for row in &rows {
            let mut col = row
                .child_named("w:trPr")
                .and_then(|p| p.child_named("w:gridBefore"))
                .and_then(|e| e.val())
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            let mut cells = Vec::new();
            for cell in block_children(row).into_iter().filter(|e| e.tag == Tag::Cell) {
                let props = cell.child(Tag::CellProps);
                let span = props
                    .and_then(|p| p.child_named("w:gridSpan"))
                    .and_then(|e| e.val())
                    .and_then(|v| v.parse::<usize>().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(1);
                let merge = match props.and_then(|p| p.child_named("w:vMerge")) {
                    Some(m) if m.val() == Some("restart") => Merge::Restart,
                    Some(_) if active.contains(&col) => Merge::Continue,
                    // A continuation with nothing above starts a merge.
                    Some(_) => Merge::Restart,
                    None => Merge::None,
                };
                match merge {
                    Merge::None => {
                        active.remove(&col);
                    }
                    _ => {
                        active.insert(col);
                    }
                }
                cells.push(RawCell {
                    col,
                    span,
                    merge,
                    element: cell,
                });
                col += span;
            }
            layout.push(cells);
        }

        let mut table_rows = Vec::with_capacity(rows.len());
        for (r, (row, cells)) in rows.iter().zip(&layout).enumerate() {
            let header = row
                .child_named("w:trPr")
                .and_then(|p| p.child_named("w:tblHeader"))
                .is_some_and(XmlElement::on_off);
            let mut out = Vec::with_capacity(cells.len());
            for raw in cells {
                if raw.merge == Merge::Continue {
                    continue;
                }
                let rowspan = match raw.merge {
                    Merge::Restart => {
                        1 + layout[r + 1..]
                            .iter()
                            .take_while(|next| {
                                next.iter()
                                    .any(|c| c.col == raw.col && c.merge == Merge::Continue)
                            })
                            .count()
                    }
                    _ => 1,
                };
                let mut blocks = self.convert_elements(part, &block_children(raw.element));
                if is_blank(&blocks) {
                    blocks.clear();
                }
                let background = match self.mode {
                    ConvertMode::Styled => raw
                        .element
                        .child(Tag::CellProps)
                        .and_then(|p| p.child_named("w:shd"))
                        .and_then(|s| s.attr("w:fill"))
                        .and_then(normalize_color),
                    ConvertMode::Semantic => None,
                };
                out.push(TableCell {
                    blocks,
                    colspan: raw.span as u32,
                    rowspan: rowspan as u32,
                    header,
                    background,
                });
            }
            table_rows.push(TableRow::new(out));
        }

        Table {
            rows: table_rows,
            column_widths,
        }
    }
}

/// Block-level children of a container, looking through wrapper elements
/// (content controls, insertions, alternate content).
pub fn block_children(element: &XmlElement) -> Vec<&XmlElement> {
    let mut out = Vec::new();
    push_block_children(element, &mut out);
    out
}

fn push_block_children<'x>(element: &'x XmlElement, out: &mut Vec<&'x XmlElement>) {
    for child in element.elements() {
        match child.tag {
            Tag::Transparent => push_block_children(child, out),
            Tag::AlternateContent => {
                if let Some(branch) = child
                    .child(Tag::Choice)
                    .or_else(|| child.child(Tag::Fallback))
                {
                    push_block_children(branch, out);
                }
            }
            Tag::SdtProps | Tag::Deleted => {}
            _ => out.push(child),
        }
    }
}

fn first_carrier(element: &XmlElement) -> Option<&XmlElement> {
    for child in element.elements() {
        if is_image_carrier(child) {
            return Some(child);
        }
        if let Some(found) = first_carrier(child) {
            return Some(found);
        }
    }
    None
}

fn note_id(reference: &XmlElement) -> Option<u32> {
    reference
        .attr("w:id")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|id| *id > 0)
}

fn is_code_style(name: &str) -> bool {
    matches!(
        name,
        "code" | "codeblock" | "sourcecode" | "htmlpreformatted" | "preformatted"
    )
}

fn is_quote_style(name: &str) -> bool {
    matches!(name, "quote" | "intensequote" | "blockquote" | "blocktext")
}

/// Whether blocks are nothing but empty unstyled paragraphs.
fn is_blank(blocks: &[Block]) -> bool {
    blocks.iter().all(|b| {
        matches!(b, Block::Paragraph { runs, style } if runs.is_empty() && style.is_empty())
    })
}

/// Target of a `HYPERLINK` field instruction.
///
/// `HYPERLINK "https://example.com" \o "tip"` yields the URL;
/// `HYPERLINK \l "anchor"` yields `#anchor`.
fn hyperlink_from_instr(instr: &str) -> Option<String> {
    let rest = instr.trim().strip_prefix("HYPERLINK")?;
    let mut local = false;
    let mut tokens = rest.split_whitespace().peekable();
    let mut target = None;
    let mut quoted = rest.split('"');
    // Quoted arguments sit at odd indices.
    let first_quoted = quoted.nth(1).map(str::to_string);
    while let Some(token) = tokens.next() {
        match token {
            "\\l" => local = true,
            t if t.starts_with('\\') => {
                tokens.next();
            }
            t if target.is_none() => {
                target = Some(t.trim_matches('"').to_string());
            }
            _ => {}
        }
    }
    let target = first_quoted.or(target).filter(|t| !t.is_empty())?;
    Some(if local { format!("#{}", target) } else { target })
}

fn paragraph_style(merged: &ParagraphProps) -> ParagraphStyle {
    let twips = |v: Option<i64>| v.map(px_from_twip);
    let first_line = match (merged.indent_first_line, merged.indent_hanging) {
        (_, Some(hanging)) if hanging != 0 => Some(-hanging),
        (first, _) => first,
    };
    ParagraphStyle {
        alignment: merged.justification.as_deref().and_then(Alignment::parse),
        indent_left: twips(merged.indent_left),
        indent_right: twips(merged.indent_right),
        first_line_indent: twips(first_line),
        space_before: twips(merged.spacing_before),
        space_after: twips(merged.spacing_after),
        line_height: merged.line.map(|line| match merged.line_rule.as_deref() {
            Some("exact") | Some("atLeast") => LineHeight::Px(px_from_twip(line)),
            _ => LineHeight::Multiple(round2(line as f64 / 240.0)),
        }),
    }
}

/// Blocks for one paragraph: text segments become paragraphs (or
/// headings), images and page breaks stay in place between them.
fn paragraph_blocks(heading: Option<u8>, style: ParagraphStyle, segments: Vec<Segment>) -> Vec<Block> {
    let mut out = Vec::new();
    for segment in segments {
        match segment {
            Segment::Runs(runs) => {
                let runs = coalesce_runs(runs);
                if runs.is_empty() {
                    continue;
                }
                out.push(match heading {
                    Some(level) => Block::Heading {
                        level: level.clamp(1, 6),
                        runs,
                        style: style.clone(),
                    },
                    None => Block::Paragraph {
                        runs,
                        style: style.clone(),
                    },
                });
            }
            Segment::Block(block) => out.push(block),
        }
    }

    if out.is_empty() {
        out.push(Block::Paragraph {
            runs: Vec::new(),
            style,
        });
    } else if let [Block::Image(image)] = out.as_mut_slice() {
        if image.align.is_none() {
            image.align = style.alignment;
        }
    }
    out
}

fn flush(pending: &mut Pending, blocks: &mut Vec<Block>) {
    match std::mem::replace(pending, Pending::None) {
        Pending::None => {}
        Pending::List(entries) => blocks.extend(build_lists(entries)),
        Pending::Code(lines) => blocks.push(Block::Code {
            text: lines.join("\n"),
            language: None,
        }),
        Pending::Quote(quoted) => blocks.push(Block::Blockquote { blocks: quoted }),
    }
}

fn build_lists(entries: Vec<ListEntry>) -> Vec<Block> {
    let mut iter = entries.into_iter().peekable();
    let mut out = Vec::new();
    while let Some(level) = iter.peek().map(|e| e.level) {
        out.push(build_list(&mut iter, level));
    }
    out
}

fn build_list<I>(iter: &mut std::iter::Peekable<I>, level: u8) -> Block
where
    I: Iterator<Item = ListEntry>,
{
    let (kind, num_id, start) = match iter.peek() {
        Some(first) => (first.kind, first.num_id.clone(), first.start),
        None => (ListKind::Bullet, String::new(), 1),
    };
    let mut items: Vec<ListItem> = Vec::new();

    while let Some(next_level) = iter.peek().map(|e| e.level) {
        if next_level < level {
            break;
        }
        if next_level > level {
            let nested = build_list(iter, next_level);
            match items.last_mut() {
                Some(item) => item.blocks.push(nested),
                None => items.push(ListItem::new(vec![nested])),
            }
            continue;
        }
        if !iter
            .peek()
            .is_some_and(|e| e.kind == kind && e.num_id == num_id)
        {
            break;
        }
        let Some(entry) = iter.next() else {
            break;
        };
        items.push(ListItem::new(entry.blocks));
    }

    let mut list_kind = kind;
    if kind == ListKind::Bullet && !items.is_empty() && items.iter().all(|i| task_glyph(i).is_some()) {
        list_kind = ListKind::Task;
        for item in &mut items {
            item.checked = strip_task_glyph(item);
        }
    }

    Block::List {
        kind: list_kind,
        start: (kind == ListKind::Ordered && start != 1).then_some(start),
        items,
    }
}

fn task_glyph(item: &ListItem) -> Option<bool> {
    let Some(Block::Paragraph { runs, .. }) = item.blocks.first() else {
        return None;
    };
    let first = runs.first()?.as_text()?.chars().next()?;
    match first {
        TASK_UNCHECKED_GLYPH => Some(false),
        TASK_CHECKED_GLYPH | '☑' => Some(true),
        _ => None,
    }
}

fn strip_task_glyph(item: &mut ListItem) -> Option<bool> {
    let checked = task_glyph(item)?;
    if let Some(Block::Paragraph { runs, .. }) = item.blocks.first_mut() {
        if let Some(RunContent::Text { text }) = runs.first_mut().map(|r| &mut r.content) {
            let stripped: String = text.chars().skip(1).collect();
            *text = stripped.strip_prefix(' ').unwrap_or(&stripped).to_string();
        }
        runs.retain(|r| r.as_text() != Some(""));
    }
    Some(checked)
}
