//! Model to HTML.
//!
//! Every block variant has exactly one HTML shape:
//!
//! | Block        | HTML                                                        |
//! |--------------|-------------------------------------------------------------|
//! | Paragraph    | `<p style>runs</p>`                                         |
//! | Heading      | `<hN style>runs</hN>`                                       |
//! | List         | `<ul>` / `<ol start>` / `<ul data-type="taskList">` of `<li>` |
//! | Blockquote   | `<blockquote>blocks</blockquote>`                           |
//! | Code         | `<pre><code class="language-x">text</code></pre>`           |
//! | Table        | `<table><colgroup/><tbody><tr><td>` with spans              |
//! | Image        | `<img src alt data-original-src width height data-align>`   |
//! | PageBreak    | `<hr data-type="page-break">`                               |
//! | RawHtml      | letterhead `<div data-letterhead>` verbatim, else `<div data-raw-html>` |
//!
//! Runs nest as `a > span[style] > strong > em > u > s > sup|sub`.

use crate::model::{
    Block, DocumentModel, ImageBlock, LineHeight, ListItem, ListKind, ParagraphStyle, Run,
    RunContent, RunStyle, Table,
};
use crate::normalize::{format_number, format_px};
use crate::xml::{escape_attr, escape_text};
use std::collections::BTreeMap;

/// Marker attribute of a letterhead region.
pub const LETTERHEAD_ATTR: &str = "data-letterhead";

/// Render a whole document: header, body, footer, then note sections.
pub fn to_html(model: &DocumentModel) -> String {
    let mut out = String::new();
    if let Some(header) = &model.header {
        out.push_str(r#"<header data-docx-part="header">"#);
        write_blocks(header, &mut out);
        out.push_str("</header>");
    }
    write_blocks(&model.blocks, &mut out);
    if let Some(footer) = &model.footer {
        out.push_str(r#"<footer data-docx-part="footer">"#);
        write_blocks(footer, &mut out);
        out.push_str("</footer>");
    }
    write_notes("footnote", &model.footnotes, &mut out);
    write_notes("endnote", &model.endnotes, &mut out);
    out
}

/// Render a block sequence.
pub fn blocks_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    write_blocks(blocks, &mut out);
    out
}

fn write_notes(kind: &str, notes: &BTreeMap<u32, Vec<Block>>, out: &mut String) {
    if notes.is_empty() {
        return;
    }
    out.push_str(&format!(r#"<section data-notes="{}">"#, kind));
    for (id, blocks) in notes {
        out.push_str(&format!(r#"<div data-{}-id="{}">"#, kind, id));
        write_blocks(blocks, out);
        out.push_str("</div>");
    }
    out.push_str("</section>");
}

fn write_blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        write_block(block, out);
    }
}

fn write_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph { runs, style } => {
            out.push_str("<p");
            write_style_attr(&paragraph_css(style), out);
            out.push('>');
            write_runs(runs, out);
            out.push_str("</p>");
        }
        Block::Heading { level, runs, style } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<h{}", level));
            write_style_attr(&paragraph_css(style), out);
            out.push('>');
            write_runs(runs, out);
            out.push_str(&format!("</h{}>", level));
        }
        Block::List { kind, start, items } => write_list(*kind, *start, items, out),
        Block::Blockquote { blocks } => {
            out.push_str("<blockquote>");
            write_blocks(blocks, out);
            out.push_str("</blockquote>");
        }
        Block::Code { text, language } => {
            out.push_str("<pre><code");
            if let Some(lang) = language {
                out.push_str(&format!(r#" class="language-{}""#, escape_attr(lang)));
            }
            out.push('>');
            out.push_str(&escape_text(text));
            out.push_str("</code></pre>");
        }
        Block::Table(table) => write_table(table, out),
        Block::Image(image) => write_image(image, out),
        Block::PageBreak => out.push_str(r#"<hr data-type="page-break">"#),
        Block::RawHtml { html } => {
            if html.trim_start().starts_with(&format!("<div {}", LETTERHEAD_ATTR)) {
                out.push_str(html);
            } else {
                out.push_str(r#"<div data-raw-html="true">"#);
                out.push_str(html);
                out.push_str("</div>");
            }
        }
    }
}

fn write_list(kind: ListKind, start: Option<u32>, items: &[ListItem], out: &mut String) {
    let tag = match kind {
        ListKind::Ordered => "ol",
        ListKind::Bullet | ListKind::Task => "ul",
    };
    out.push('<');
    out.push_str(tag);
    match kind {
        ListKind::Task => out.push_str(r#" data-type="taskList""#),
        ListKind::Ordered => {
            if let Some(start) = start.filter(|s| *s != 1) {
                out.push_str(&format!(r#" start="{}""#, start));
            }
        }
        ListKind::Bullet => {}
    }
    out.push('>');
    for item in items {
        if kind == ListKind::Task {
            out.push_str(&format!(
                r#"<li data-type="taskItem" data-checked="{}">"#,
                item.checked.unwrap_or(false)
            ));
        } else {
            out.push_str("<li>");
        }
        write_blocks(&item.blocks, out);
        out.push_str("</li>");
    }
    out.push_str(&format!("</{}>", tag));
}

fn write_table(table: &Table, out: &mut String) {
    out.push_str("<table>");
    if !table.column_widths.is_empty() {
        out.push_str("<colgroup>");
        for width in &table.column_widths {
            out.push_str(&format!(r#"<col style="width: {}">"#, format_px(*width)));
        }
        out.push_str("</colgroup>");
    }
    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            let tag = if cell.header { "th" } else { "td" };
            out.push('<');
            out.push_str(tag);
            if cell.colspan > 1 {
                out.push_str(&format!(r#" colspan="{}""#, cell.colspan));
            }
            if cell.rowspan > 1 {
                out.push_str(&format!(r#" rowspan="{}""#, cell.rowspan));
            }
            if let Some(background) = &cell.background {
                write_style_attr(&format!("background-color: {}", background), out);
            }
            out.push('>');
            write_blocks(&cell.blocks, out);
            out.push_str(&format!("</{}>", tag));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn write_image(image: &ImageBlock, out: &mut String) {
    out.push_str(&format!(r#"<img src="{}""#, escape_attr(&image.src)));
    if let Some(alt) = &image.alt {
        out.push_str(&format!(r#" alt="{}""#, escape_attr(alt)));
    }
    if let Some(original) = &image.original_src {
        out.push_str(&format!(r#" data-original-src="{}""#, escape_attr(original)));
    }
    if let Some(width) = image.width {
        out.push_str(&format!(r#" width="{}""#, format_number(width)));
    }
    if let Some(height) = image.height {
        out.push_str(&format!(r#" height="{}""#, format_number(height)));
    }
    if let Some(align) = image.align {
        out.push_str(&format!(r#" data-align="{}""#, align.as_css()));
    }
    if let Some(m) = image.margins {
        write_style_attr(
            &format!(
                "margin: {} {} {} {}",
                format_px(m.top),
                format_px(m.right),
                format_px(m.bottom),
                format_px(m.left)
            ),
            out,
        );
    }
    out.push('>');
}

fn write_style_attr(css: &str, out: &mut String) {
    if !css.is_empty() {
        out.push_str(&format!(r#" style="{}""#, escape_attr(css)));
    }
}

/// CSS declarations for a paragraph style, in a fixed order.
pub fn paragraph_css(style: &ParagraphStyle) -> String {
    let mut decls = Vec::new();
    if let Some(align) = style.alignment {
        decls.push(format!("text-align: {}", align.as_css()));
    }
    if let Some(v) = style.indent_left {
        decls.push(format!("margin-left: {}", format_px(v)));
    }
    if let Some(v) = style.indent_right {
        decls.push(format!("margin-right: {}", format_px(v)));
    }
    if let Some(v) = style.first_line_indent {
        decls.push(format!("text-indent: {}", format_px(v)));
    }
    match style.line_height {
        Some(LineHeight::Multiple(m)) => decls.push(format!("line-height: {}", format_number(m))),
        Some(LineHeight::Px(px)) => decls.push(format!("line-height: {}", format_px(px))),
        None => {}
    }
    if let Some(v) = style.space_before {
        decls.push(format!("margin-top: {}", format_px(v)));
    }
    if let Some(v) = style.space_after {
        decls.push(format!("margin-bottom: {}", format_px(v)));
    }
    decls.join("; ")
}

/// CSS declarations carried by a run's `span`.
pub fn run_css(style: &RunStyle) -> String {
    let mut decls = Vec::new();
    if let Some(family) = &style.font_family {
        decls.push(format!("font-family: {}", family));
    }
    if let Some(size) = style.font_size {
        decls.push(format!("font-size: {}", format_px(size)));
    }
    if let Some(color) = &style.color {
        decls.push(format!("color: {}", color));
    }
    if let Some(background) = &style.background {
        decls.push(format!("background-color: {}", background));
    }
    decls.join("; ")
}

/// Render runs as inline HTML.
pub fn runs_to_html(runs: &[Run]) -> String {
    let mut out = String::new();
    write_runs(runs, &mut out);
    out
}

fn write_runs(runs: &[Run], out: &mut String) {
    for run in runs {
        match &run.content {
            RunContent::Text { text } => write_text_run(text, &run.style, out),
            RunContent::LineBreak => out.push_str("<br>"),
            RunContent::FootnoteRef { id } => out.push_str(&format!(
                r#"<sup class="footnote-ref" data-footnote-id="{0}">{0}</sup>"#,
                id
            )),
            RunContent::EndnoteRef { id } => out.push_str(&format!(
                r#"<sup class="endnote-ref" data-endnote-id="{0}">{0}</sup>"#,
                id
            )),
        }
    }
}

fn write_text_run(text: &str, style: &RunStyle, out: &mut String) {
    let mut close: Vec<&str> = Vec::new();
    if let Some(link) = &style.link {
        out.push_str(&format!(r#"<a href="{}">"#, escape_attr(link)));
        close.push("</a>");
    }
    let css = run_css(style);
    if !css.is_empty() {
        out.push_str("<span");
        write_style_attr(&css, out);
        out.push('>');
        close.push("</span>");
    }
    let toggles = [
        (style.bold, "strong"),
        (style.italic, "em"),
        (style.underline, "u"),
        (style.strike, "s"),
        (style.superscript, "sup"),
        (style.subscript && !style.superscript, "sub"),
    ];
    for (on, tag) in toggles {
        if on {
            out.push_str(&format!("<{}>", tag));
            close.push(match tag {
                "strong" => "</strong>",
                "em" => "</em>",
                "u" => "</u>",
                "s" => "</s>",
                "sup" => "</sup>",
                _ => "</sub>",
            });
        }
    }
    out.push_str(&escape_text(text));
    for tag in close.iter().rev() {
        out.push_str(tag);
    }
}
