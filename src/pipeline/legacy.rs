//! Salvage decoding of damaged main document parts.
//!
//! Works on the raw part text without building a tree, so unbalanced or
//! truncated markup still yields its paragraphs.

use crate::model::{Block, Run};

/// Paragraph texts found in raw WordprocessingML.
pub fn salvage_paragraphs(xml: &str) -> Vec<Block> {
    xml.split("</w:p>")
        .filter_map(|chunk| {
            let text = chunk_text(chunk);
            (!text.trim().is_empty()).then(|| Block::paragraph(vec![Run::text(text)]))
        })
        .collect()
}

/// Concatenated `w:t` contents of a chunk.
fn chunk_text(chunk: &str) -> String {
    let mut out = String::new();
    let mut rest = chunk;
    while let Some(start) = rest.find("<w:t") {
        let after = &rest[start + 4..];
        // `<w:tab>`, `<w:tbl>`, `<w:tc>` share the prefix.
        let Some(next) = after.chars().next() else {
            break;
        };
        if next != '>' && next != ' ' && next != '/' {
            rest = after;
            continue;
        }
        let Some(open_end) = after.find('>') else {
            break;
        };
        if after[..open_end].ends_with('/') {
            rest = &after[open_end + 1..];
            continue;
        }
        let content = &after[open_end + 1..];
        let close = content.find("</w:t>").unwrap_or(content.len());
        out.push_str(&unescape(&content[..close]));
        rest = &content[close..];
    }
    out
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|i| *i <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
