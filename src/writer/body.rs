//! Canonical blocks to WordprocessingML.

use super::parts::{rel_type, NumInstance, BULLET_ABSTRACT, LIST_LEVELS, ORDERED_ABSTRACT};
use super::patch::endnote_placeholder;
use crate::container::{Relationship, Relationships};
use crate::html::from_html;
use crate::model::{
    extension_from_mime, from_data_uri, image_dimensions, Block, ImageBlock,
    LineHeight, ListItem, ListKind, ParagraphStyle, Run, RunContent, RunStyle, Table, TableCell,
    TASK_CHECKED_GLYPH, TASK_UNCHECKED_GLYPH,
};
use crate::normalize::{emu_from_px, half_points_from_px, primary_family, twip_from_px};
use crate::options::EncodeOptions;
use crate::xml::{escape_attr, escape_text};
use std::collections::{BTreeMap, BTreeSet};

/// Where list paragraphs get their `w:numId`.
pub(crate) trait ListNumbering {
    fn num_id(&mut self, kind: ListKind, level: u8, start: Option<u32>) -> u32;
}

/// Allocates a fresh numbering instance per list so adjacent lists stay
/// separate and each ordered list can restart.
#[derive(Debug, Default)]
pub(crate) struct NumberingPlan {
    pub instances: Vec<NumInstance>,
}

impl NumberingPlan {
    /// Instances 1 (bullet) and 2 (ordered) always exist for later parts
    /// to reuse.
    pub fn new() -> Self {
        Self {
            instances: vec![
                NumInstance {
                    num_id: 1,
                    abstract_id: BULLET_ABSTRACT,
                    start: None,
                },
                NumInstance {
                    num_id: 2,
                    abstract_id: ORDERED_ABSTRACT,
                    start: None,
                },
            ],
        }
    }
}

impl ListNumbering for NumberingPlan {
    fn num_id(&mut self, kind: ListKind, level: u8, start: Option<u32>) -> u32 {
        let num_id = self.instances.len() as u32 + 1;
        let abstract_id = match kind {
            ListKind::Ordered => ORDERED_ABSTRACT,
            ListKind::Bullet | ListKind::Task => BULLET_ABSTRACT,
        };
        self.instances.push(NumInstance {
            num_id,
            abstract_id,
            start: start.filter(|s| *s != 1).map(|s| (level, s)),
        });
        num_id
    }
}

/// An image file destined for `word/media/`.
#[derive(Debug, Clone)]
pub(crate) struct MediaFile {
    /// Path inside the package
    pub path: String,
    pub extension: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// Media and drawing ids shared by every part of one package.
#[derive(Debug)]
pub(crate) struct Resources {
    pub media: Vec<MediaFile>,
    next_media: usize,
    next_drawing: u32,
}

impl Resources {
    pub fn new(next_media: usize, next_drawing: u32) -> Self {
        Self {
            media: Vec::new(),
            next_media,
            next_drawing,
        }
    }

    fn add_media(&mut self, mime: &str, data: Vec<u8>) -> String {
        let extension = extension_from_mime(mime).unwrap_or("bin").to_string();
        let name = format!("media/image{}.{}", self.next_media, extension);
        self.next_media += 1;
        self.media.push(MediaFile {
            path: format!("word/{}", name),
            extension,
            mime: mime.to_string(),
            data,
        });
        name
    }

    fn drawing_id(&mut self) -> u32 {
        let id = self.next_drawing;
        self.next_drawing += 1;
        id
    }

    /// (extension, MIME) pairs of the collected media.
    pub fn extensions(&self) -> BTreeSet<(String, String)> {
        self.media
            .iter()
            .map(|m| (m.extension.clone(), m.mime.clone()))
            .collect()
    }
}

/// Writes the blocks of one part, registering hyperlinks and images in
/// that part's relationships.
pub(crate) struct BlockWriter<'a> {
    options: &'a EncodeOptions,
    numbering: &'a mut dyn ListNumbering,
    resources: &'a mut Resources,
    pub rels: Relationships,
    pub endnote_refs: BTreeSet<u32>,
    out: String,
}

impl<'a> BlockWriter<'a> {
    pub fn new(
        options: &'a EncodeOptions,
        numbering: &'a mut dyn ListNumbering,
        resources: &'a mut Resources,
        rels: Relationships,
    ) -> Self {
        Self {
            options,
            numbering,
            resources,
            rels,
            endnote_refs: BTreeSet::new(),
            out: String::new(),
        }
    }

    /// The XML written so far, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn write_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.write_block(block);
        }
    }

    /// Note bodies keyed by id, each opening with its reference mark.
    pub fn write_notes(&mut self, kind: &str, mark_style: &str, notes: &BTreeMap<u32, Vec<Block>>) {
        let mark = format!(
            r#"<w:r><w:rPr><w:rStyle w:val="{}"/></w:rPr><w:{}Ref/></w:r><w:r><w:t xml:space="preserve"> </w:t></w:r>"#,
            mark_style, kind
        );
        for (id, blocks) in notes {
            self.out.push_str(&format!(r#"<w:{} w:id="{}">"#, kind, id));
            match blocks.split_first() {
                Some((Block::Paragraph { runs, style }, rest)) => {
                    self.paragraph(None, None, style, &mark, runs);
                    self.write_blocks(rest);
                }
                _ => {
                    self.out.push_str(&format!("<w:p>{}</w:p>", mark));
                    self.write_blocks(blocks);
                }
            }
            self.out.push_str(&format!("</w:{}>", kind));
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph { runs, style } => self.paragraph(None, None, style, "", runs),
            Block::Heading { level, runs, style } => {
                let style_id = format!("Heading{}", (*level).clamp(1, 6));
                self.paragraph(Some(&style_id), None, style, "", runs);
            }
            Block::List { kind, start, items } => self.list(*kind, *start, items, 0),
            Block::Blockquote { blocks } => self.blockquote(blocks),
            Block::Code { text, .. } => {
                for line in text.split('\n') {
                    self.out.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Code"/></w:pPr>"#);
                    if !line.is_empty() {
                        self.out.push_str(&text_run(line, ""));
                    }
                    self.out.push_str("</w:p>");
                }
            }
            Block::Table(table) => self.table(table),
            Block::Image(image) => {
                if let Some(drawing) = self.drawing(image) {
                    self.out.push_str("<w:p>");
                    if let Some(align) = image.align {
                        self.out.push_str(&format!(
                            r#"<w:pPr><w:jc w:val="{}"/></w:pPr>"#,
                            align.as_ooxml()
                        ));
                    }
                    self.out.push_str(&format!("<w:r>{}</w:r></w:p>", drawing));
                }
            }
            Block::PageBreak => self
                .out
                .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
            Block::RawHtml { html } => self.raw_html(html),
        }
    }

    fn paragraph(
        &mut self,
        style_id: Option<&str>,
        numbering: Option<(u32, u8)>,
        style: &ParagraphStyle,
        prefix: &str,
        runs: &[Run],
    ) {
        self.out.push_str("<w:p>");
        self.out
            .push_str(&paragraph_properties(style_id, numbering, style));
        self.out.push_str(prefix);
        let runs = self.runs(runs);
        self.out.push_str(&runs);
        self.out.push_str("</w:p>");
    }

    fn runs(&mut self, runs: &[Run]) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < runs.len() {
            let Some(target) = runs[i].style.link.clone() else {
                out.push_str(&self.run(&runs[i], None));
                i += 1;
                continue;
            };
            let end = runs[i..]
                .iter()
                .position(|r| r.style.link.as_deref() != Some(target.as_str()))
                .map_or(runs.len(), |n| i + n);
            let open = match target.strip_prefix('#') {
                Some(anchor) => format!(r#"<w:hyperlink w:anchor="{}">"#, escape_attr(anchor)),
                None => {
                    let id = self.relate("hyperlink", &target, true);
                    format!(r#"<w:hyperlink r:id="{}">"#, id)
                }
            };
            out.push_str(&open);
            for run in &runs[i..end] {
                out.push_str(&self.run(run, Some("Hyperlink")));
            }
            out.push_str("</w:hyperlink>");
            i = end;
        }
        out
    }

    fn run(&mut self, run: &Run, char_style: Option<&str>) -> String {
        match &run.content {
            RunContent::Text { text } => text_run(text, &run_properties(&run.style, char_style)),
            RunContent::LineBreak => "<w:r><w:br/></w:r>".to_string(),
            RunContent::FootnoteRef { id } => format!(
                r#"<w:r><w:rPr><w:rStyle w:val="FootnoteReference"/></w:rPr><w:footnoteReference w:id="{}"/></w:r>"#,
                id
            ),
            RunContent::EndnoteRef { id } => {
                self.endnote_refs.insert(*id);
                format!(
                    r#"<w:r><w:rPr><w:rStyle w:val="EndnoteReference"/></w:rPr>{}</w:r>"#,
                    endnote_placeholder(*id)
                )
            }
        }
    }

    fn list(&mut self, kind: ListKind, start: Option<u32>, items: &[ListItem], depth: u8) {
        let level = depth.min(LIST_LEVELS - 1);
        let num_id = self.numbering.num_id(kind, level, start);
        for item in items {
            let glyph = match (kind, item.checked) {
                (ListKind::Task, Some(true)) => Some(TASK_CHECKED_GLYPH),
                (ListKind::Task, _) => Some(TASK_UNCHECKED_GLYPH),
                _ => None,
            };
            let prefix = glyph.map(|g| text_run(&format!("{} ", g), "")).unwrap_or_default();

            let mut rest = item.blocks.as_slice();
            match rest.split_first() {
                Some((Block::Paragraph { runs, style }, tail)) => {
                    self.paragraph(None, Some((num_id, level)), style, &prefix, runs);
                    rest = tail;
                }
                _ if glyph.is_some() => {
                    self.paragraph(None, Some((num_id, level)), &ParagraphStyle::default(), &prefix, &[]);
                }
                _ => {}
            }
            for block in rest {
                match block {
                    Block::List { kind, start, items } => {
                        self.list(*kind, *start, items, depth + 1)
                    }
                    other => self.write_block(other),
                }
            }
        }
    }

    fn blockquote(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Paragraph { runs, style } => {
                    self.paragraph(Some("Quote"), None, style, "", runs)
                }
                Block::Blockquote { blocks } => self.blockquote(blocks),
                other => self.write_block(other),
            }
        }
    }

    fn table(&mut self, table: &Table) {
        let layout = layout_table(table);
        let columns = layout.iter().map(|row| row.width).max().unwrap_or(0);

        self.out.push_str(concat!(
            r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"</w:tblBorders></w:tblPr><w:tblGrid>"#
        ));
        // Without width hints the grid carries column count only.
        for col in 0..columns {
            match table.column_widths.get(col) {
                Some(width) => self
                    .out
                    .push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, twip_from_px(*width))),
                None => self.out.push_str("<w:gridCol/>"),
            }
        }
        self.out.push_str("</w:tblGrid>");

        for (row, laid) in table.rows.iter().zip(&layout) {
            self.out.push_str("<w:tr>");
            if !row.cells.is_empty() && row.cells.iter().all(|c| c.header) {
                self.out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for slot in &laid.slots {
                match slot {
                    Slot::Cell { index, col } => self.cell(table, &row.cells[*index], *col),
                    Slot::Continue { span, col } => {
                        self.out.push_str("<w:tc><w:tcPr>");
                        self.out.push_str(&cell_width(table, *col, *span));
                        if *span > 1 {
                            self.out
                                .push_str(&format!(r#"<w:gridSpan w:val="{}"/>"#, span));
                        }
                        self.out.push_str("<w:vMerge/></w:tcPr><w:p/></w:tc>");
                    }
                }
            }
            self.out.push_str("</w:tr>");
        }
        self.out.push_str("</w:tbl>");
    }

    fn cell(&mut self, table: &Table, cell: &TableCell, col: usize) {
        let span = cell.colspan.max(1) as usize;
        self.out.push_str("<w:tc><w:tcPr>");
        self.out.push_str(&cell_width(table, col, span));
        if span > 1 {
            self.out
                .push_str(&format!(r#"<w:gridSpan w:val="{}"/>"#, span));
        }
        if cell.rowspan > 1 {
            self.out.push_str(r#"<w:vMerge w:val="restart"/>"#);
        }
        if let Some(fill) = &cell.background {
            self.out.push_str(&format!(
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                bare_hex(fill)
            ));
        }
        self.out.push_str("</w:tcPr>");

        let before = self.out.len();
        self.write_blocks(&cell.blocks);
        // A cell must end in a paragraph.
        if self.out.len() == before || self.out.ends_with("</w:tbl>") {
            self.out.push_str("<w:p/>");
        }
        self.out.push_str("</w:tc>");
    }

    fn drawing(&mut self, image: &ImageBlock) -> Option<String> {
        let Some((mime, data)) = from_data_uri(image.data_source()) else {
            log::warn!("image skipped: source is not an embedded data URI");
            return None;
        };
        let (width, height) = self.image_extent(image, &data);
        let target = self.resources.add_media(&mime, data);
        let rel_id = self.relate("image", &target, false);
        let drawing_id = self.resources.drawing_id();

        let margins = image.margins.unwrap_or_default();
        let (cx, cy) = (emu_from_px(width), emu_from_px(height));
        let descr = image
            .alt
            .as_deref()
            .map(|alt| format!(r#" descr="{}""#, escape_attr(alt)))
            .unwrap_or_default();

        Some(format!(
            concat!(
                r#"<w:drawing><wp:inline distT="{dt}" distB="{db}" distL="{dl}" distR="{dr}">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{id}" name="Picture {id}"{descr}/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing>"#
            ),
            dt = emu_from_px(margins.top),
            db = emu_from_px(margins.bottom),
            dl = emu_from_px(margins.left),
            dr = emu_from_px(margins.right),
            cx = cx,
            cy = cy,
            id = drawing_id,
            descr = descr,
            rel = rel_id,
        ))
    }

    /// Display size in pixels, scaled down to the content width.
    fn image_extent(&self, image: &ImageBlock, data: &[u8]) -> (f64, f64) {
        let intrinsic = image_dimensions(data)
            .filter(|(w, h)| *w > 0 && *h > 0)
            .map(|(w, h)| (w as f64, h as f64));
        let fallback = self.options.default_image_width_px;
        let (width, height) = match (image.width, image.height, intrinsic) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some((iw, ih))) => (w, w * ih / iw),
            (None, Some(h), Some((iw, ih))) => (h * iw / ih, h),
            (Some(w), None, None) => (w, w),
            (None, Some(h), None) => (h, h),
            (None, None, Some(size)) => size,
            (None, None, None) => (fallback, fallback),
        };

        let max = self.options.content_width_px();
        if width > max && width > 0.0 {
            (max, height * max / width)
        } else {
            (width, height)
        }
    }

    fn raw_html(&mut self, html: &str) {
        if html.trim() == "<hr>" {
            self.out.push_str(r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr></w:pPr></w:p>"#);
            return;
        }
        let letterhead = html.trim_start().starts_with("<div data-letterhead");
        let mut blocks = match from_html(html) {
            Ok(model) => model.blocks,
            Err(e) => {
                log::warn!("raw HTML skipped: {}", e);
                return;
            }
        };

        // The letterhead wrapper parses back to itself; unwrap one level.
        if let [Block::RawHtml { html: inner }] = blocks.as_slice() {
            let content = inner
                .split_once('>')
                .map(|(_, rest)| rest.strip_suffix("</div>").unwrap_or(rest))
                .unwrap_or_default();
            blocks = from_html(content).map(|m| m.blocks).unwrap_or_default();
        }
        if letterhead {
            while matches!(blocks.last(), Some(Block::Paragraph { runs, .. }) if runs.is_empty()) {
                blocks.pop();
            }
        }

        for block in &blocks {
            match block {
                Block::RawHtml { html } if html.trim() == "<hr>" => self.raw_html(html),
                Block::RawHtml { .. } => {
                    let text = block.plain_text();
                    if !text.is_empty() {
                        self.paragraph(None, None, &ParagraphStyle::default(), "", &[Run::text(text)]);
                    }
                }
                other => self.write_block(other),
            }
        }
        if letterhead {
            self.out.push_str(r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="18" w:space="1" w:color="FF0000"/></w:pBdr></w:pPr></w:p>"#);
        }
    }

    fn relate(&mut self, short_type: &str, target: &str, external: bool) -> String {
        let id = self.rels.next_id();
        self.rels.add(Relationship {
            id: id.clone(),
            rel_type: rel_type(short_type),
            target: target.to_string(),
            external,
        });
        id
    }
}

/// One position in a laid-out row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// A model cell, by index in its row, starting at grid column `col`
    Cell { index: usize, col: usize },
    /// A vertical-merge continuation of the cell above
    Continue { span: usize, col: usize },
}

#[derive(Debug, Default)]
struct RowLayout {
    slots: Vec<Slot>,
    width: usize,
}

/// Place cells on the grid, inserting continuation cells under row spans.
fn layout_table(table: &Table) -> Vec<RowLayout> {
    // Grid column -> (rows still covered, span) of an open row span.
    let mut open: BTreeMap<usize, (u32, usize)> = BTreeMap::new();
    let mut rows = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let mut layout = RowLayout::default();
        let mut col = 0;
        let mut cells = row.cells.iter().enumerate();
        loop {
            if let Some(&(_, span)) = open.get(&col) {
                layout.slots.push(Slot::Continue { span, col });
                col += span;
                continue;
            }
            let Some((index, cell)) = cells.next() else {
                break;
            };
            let span = cell.colspan.max(1) as usize;
            layout.slots.push(Slot::Cell { index, col });
            if cell.rowspan > 1 {
                open.insert(col, (cell.rowspan, span));
            }
            col += span;
        }
        // Spans open to the right of the last cell.
        let trailing: Vec<(usize, usize)> = open
            .range(col..)
            .map(|(c, (_, span))| (*c, *span))
            .collect();
        for (c, span) in trailing {
            layout.slots.push(Slot::Continue { span, col: c });
            col = c + span;
        }
        layout.width = col;

        // Every span opened or continued in this row covers one row less.
        for slot in &layout.slots {
            let start = match slot {
                Slot::Cell { col, .. } | Slot::Continue { col, .. } => *col,
            };
            if let Some((remaining, _)) = open.get_mut(&start) {
                *remaining -= 1;
            }
        }
        open.retain(|_, (remaining, _)| *remaining > 0);
        rows.push(layout);
    }
    rows
}

fn cell_width(table: &Table, col: usize, span: usize) -> String {
    let widths = table.column_widths.get(col..col + span);
    match widths {
        Some(widths) if !widths.is_empty() => format!(
            r#"<w:tcW w:w="{}" w:type="dxa"/>"#,
            twip_from_px(widths.iter().sum())
        ),
        _ => String::new(),
    }
}

/// `w:pPr` for a paragraph, empty when nothing is set.
fn paragraph_properties(
    style_id: Option<&str>,
    numbering: Option<(u32, u8)>,
    style: &ParagraphStyle,
) -> String {
    let mut props = String::new();
    if let Some(id) = style_id {
        props.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape_attr(id)));
    }
    if let Some((num_id, level)) = numbering {
        props.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
            level, num_id
        ));
    }

    let mut spacing = String::new();
    if let Some(before) = style.space_before {
        spacing.push_str(&format!(r#" w:before="{}""#, twip_from_px(before)));
    }
    if let Some(after) = style.space_after {
        spacing.push_str(&format!(r#" w:after="{}""#, twip_from_px(after)));
    }
    match style.line_height {
        Some(LineHeight::Multiple(multiple)) => spacing.push_str(&format!(
            r#" w:line="{}" w:lineRule="auto""#,
            (multiple * 240.0).round() as i64
        )),
        Some(LineHeight::Px(px)) => spacing.push_str(&format!(
            r#" w:line="{}" w:lineRule="exact""#,
            twip_from_px(px)
        )),
        None => {}
    }
    if !spacing.is_empty() {
        props.push_str(&format!("<w:spacing{}/>", spacing));
    }

    let mut indent = String::new();
    if let Some(left) = style.indent_left {
        indent.push_str(&format!(r#" w:left="{}""#, twip_from_px(left)));
    }
    if let Some(right) = style.indent_right {
        indent.push_str(&format!(r#" w:right="{}""#, twip_from_px(right)));
    }
    match style.first_line_indent {
        Some(first) if first < 0.0 => {
            indent.push_str(&format!(r#" w:hanging="{}""#, twip_from_px(-first)))
        }
        Some(first) => indent.push_str(&format!(r#" w:firstLine="{}""#, twip_from_px(first))),
        None => {}
    }
    if !indent.is_empty() {
        props.push_str(&format!("<w:ind{}/>", indent));
    }

    if let Some(align) = style.alignment {
        props.push_str(&format!(r#"<w:jc w:val="{}"/>"#, align.as_ooxml()));
    }

    if props.is_empty() {
        props
    } else {
        format!("<w:pPr>{}</w:pPr>", props)
    }
}

/// `w:rPr` in schema order, empty when nothing is set.
fn run_properties(style: &RunStyle, char_style: Option<&str>) -> String {
    let mut props = String::new();
    if let Some(id) = char_style {
        props.push_str(&format!(r#"<w:rStyle w:val="{}"/>"#, id));
    }
    if let Some(family) = style.font_family.as_deref().and_then(primary_family) {
        let family = escape_attr(&family);
        props.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
            family
        ));
    }
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if style.strike {
        props.push_str("<w:strike/>");
    }
    if let Some(color) = &style.color {
        props.push_str(&format!(r#"<w:color w:val="{}"/>"#, bare_hex(color)));
    }
    if let Some(size) = style.font_size {
        let half_points = half_points_from_px(size);
        props.push_str(&format!(
            r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
            half_points
        ));
    }
    if style.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(fill) = &style.background {
        props.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
            bare_hex(fill)
        ));
    }
    if style.superscript {
        props.push_str(r#"<w:vertAlign w:val="superscript"/>"#);
    } else if style.subscript {
        props.push_str(r#"<w:vertAlign w:val="subscript"/>"#);
    }

    if props.is_empty() {
        props
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    }
}

/// A text run; tabs and newlines become `w:tab` and `w:br`.
fn text_run(text: &str, properties: &str) -> String {
    let mut out = format!("<w:r>{}", properties);
    let mut pending = String::new();
    let flush = |pending: &mut String, out: &mut String| {
        if !pending.is_empty() {
            out.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape_text(pending)
            ));
            pending.clear();
        }
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut pending, &mut out);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut pending, &mut out);
                out.push_str("<w:br/>");
            }
            // Not representable in XML 1.0.
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => pending.push(c),
        }
    }
    flush(&mut pending, &mut out);
    out.push_str("</w:r>");
    out
}

/// `#RRGGBB` to the bare `RRGGBB` OOXML expects.
fn bare_hex(color: &str) -> String {
    color.trim_start_matches('#').to_ascii_uppercase()
}
