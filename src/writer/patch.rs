//! Endnote patch step.
//!
//! The base builder writes each endnote reference as placeholder text in a
//! bare `w:t`. Text runs always carry `xml:space="preserve"`, so document
//! text that happens to look like a placeholder is never rewritten. This pass reopens the finished package, writes `word/endnotes.xml`,
//! turns the placeholders into `w:endnoteReference` elements and declares
//! the new part in the manifest and the document relationships. Lists
//! inside endnotes reuse the numbering instances already in the package.

use super::body::{BlockWriter, ListNumbering, Resources};
use super::parts::{
    default_content_type, note_separators, override_content_type, part_root, rel_type,
    relationships_xml, CT_ENDNOTES,
};
use super::write_zip;
use crate::container::{parse_relationships_xml, OoxmlContainer, Relationship, Relationships};
use crate::docx::NumberingMap;
use crate::error::{Error, Result};
use crate::model::{Block, ListKind};
use crate::options::EncodeOptions;
use std::collections::BTreeMap;

const PLACEHOLDER_OPEN: &str = "⟦endnote:";
const PLACEHOLDER_CLOSE: &str = "⟧";
const PLACEHOLDER_START: &str = "<w:t>⟦endnote:";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

/// Text element standing in for an endnote reference until patched.
pub(crate) fn endnote_placeholder(id: u32) -> String {
    format!(
        "<w:t>{}{}{}</w:t>",
        PLACEHOLDER_OPEN, id, PLACEHOLDER_CLOSE
    )
}

/// Numbering ids already defined in the package, one per list kind.
struct ExistingNumbering {
    bullet: u32,
    ordered: u32,
}

impl ExistingNumbering {
    fn from_map(map: &NumberingMap) -> Self {
        let first = |kind| {
            map.num_ids_of_kind(kind)
                .first()
                .and_then(|id| id.parse::<u32>().ok())
        };
        let bullet = first(ListKind::Bullet).unwrap_or(1);
        Self {
            bullet,
            ordered: first(ListKind::Ordered).unwrap_or(bullet),
        }
    }
}

impl ListNumbering for ExistingNumbering {
    fn num_id(&mut self, kind: ListKind, _level: u8, _start: Option<u32>) -> u32 {
        match kind {
            ListKind::Ordered => self.ordered,
            ListKind::Bullet | ListKind::Task => self.bullet,
        }
    }
}

/// Add an endnotes part to an encoded package.
///
/// Every endnote placeholder in the package must have a body in
/// `endnotes`; id 0 is reserved for the separator.
pub fn add_endnotes(
    package: Vec<u8>,
    endnotes: &BTreeMap<u32, Vec<Block>>,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    if endnotes.contains_key(&0) {
        return Err(Error::Encode(
            "endnote id 0 is reserved for the continuation separator".to_string(),
        ));
    }

    let container = OoxmlContainer::from_bytes(package)?;
    let mut entries = container.read_all_entries()?;
    let numbering = container
        .read_xml("word/numbering.xml")
        .ok()
        .and_then(|xml| NumberingMap::parse(&xml).ok())
        .unwrap_or_default();
    let mut doc_rels = parse_relationships_xml(&container.read_xml(DOCUMENT_RELS)?)?;

    let media_count = entries
        .iter()
        .filter(|(name, _)| name.starts_with("word/media/"))
        .count();
    let drawings: usize = entries
        .iter()
        .filter(|(name, _)| name.starts_with("word/") && name.ends_with(".xml"))
        .map(|(_, data)| String::from_utf8_lossy(data).matches("<wp:docPr ").count())
        .sum();

    let mut list_ids = ExistingNumbering::from_map(&numbering);
    let mut resources = Resources::new(media_count + 1, drawings as u32 + 1);
    let (notes_xml, notes_rels) = {
        let mut writer =
            BlockWriter::new(options, &mut list_ids, &mut resources, Relationships::new());
        writer.write_notes("endnote", "EndnoteReference", endnotes);
        (writer.take(), writer.rels)
    };
    let endnotes_xml = part_root(
        "w:endnotes",
        &format!("{}{}", note_separators("endnote"), notes_xml),
    );

    let rel_id = doc_rels.next_id();
    doc_rels.add(Relationship {
        id: rel_id,
        rel_type: rel_type("endnotes"),
        target: "endnotes.xml".to_string(),
        external: false,
    });

    for (name, data) in entries.iter_mut() {
        if name == DOCUMENT_RELS {
            *data = relationships_xml(&doc_rels).into_bytes();
        } else if name == "[Content_Types].xml" {
            let manifest = String::from_utf8_lossy(data).into_owned();
            *data = declare_parts(&manifest, &resources)?.into_bytes();
        } else if name.starts_with("word/") && name.ends_with(".xml") {
            let xml = String::from_utf8_lossy(data);
            if xml.contains(PLACEHOLDER_START) {
                *data = resolve_placeholders(&xml, endnotes)?.into_bytes();
            }
        }
    }

    entries.push((
        "word/endnotes.xml".to_string(),
        resolve_placeholders(&endnotes_xml, endnotes)?.into_bytes(),
    ));
    if !notes_rels.is_empty() {
        entries.push((
            "word/_rels/endnotes.xml.rels".to_string(),
            relationships_xml(&notes_rels).into_bytes(),
        ));
    }
    for media in resources.media {
        entries.push((media.path, media.data));
    }

    log::debug!("patched {} endnote(s) into the package", endnotes.len());
    write_zip(&entries)
}

/// Replace each placeholder with a reference; a placeholder without a
/// matching endnote body is an error.
fn resolve_placeholders(xml: &str, endnotes: &BTreeMap<u32, Vec<Block>>) -> Result<String> {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find(PLACEHOLDER_START) {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let end = after
            .find("</w:t>")
            .ok_or_else(|| Error::Encode("unterminated endnote placeholder".to_string()))?;
        let id = after[..end]
            .rsplit(PLACEHOLDER_OPEN)
            .next()
            .and_then(|tail| tail.strip_suffix(PLACEHOLDER_CLOSE))
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| Error::Encode("malformed endnote placeholder".to_string()))?;
        if !endnotes.contains_key(&id) {
            return Err(Error::Encode(format!(
                "endnote reference {} has no endnote body",
                id
            )));
        }
        out.push_str(&format!(r#"<w:endnoteReference w:id="{}"/>"#, id));
        rest = &after[end + "</w:t>".len()..];
    }
    out.push_str(rest);

    if out.contains(PLACEHOLDER_START) {
        return Err(Error::Encode(
            "endnote placeholder left after patching".to_string(),
        ));
    }
    Ok(out)
}

/// Declare the endnotes part and any new media extensions.
fn declare_parts(manifest: &str, resources: &Resources) -> Result<String> {
    let close = manifest
        .rfind("</Types>")
        .ok_or_else(|| Error::Encode("manifest has no Types element".to_string()))?;
    let mut additions = override_content_type("word/endnotes.xml", CT_ENDNOTES);
    for (extension, mime) in resources.extensions() {
        if !manifest.contains(&format!(r#"Extension="{}""#, extension)) {
            additions.push_str(&default_content_type(&extension, &mime));
        }
    }
    Ok(format!("{}{}{}", &manifest[..close], additions, &manifest[close..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentModel, Run};
    use crate::writer::encode;

    fn note(text: &str) -> Vec<Block> {
        vec![Block::paragraph(vec![Run::text(text)])]
    }

    #[test]
    fn test_placeholders_become_references() {
        let mut endnotes = BTreeMap::new();
        endnotes.insert(2, note("two"));
        let xml = format!("<w:r>{}</w:r>", endnote_placeholder(2));
        assert_eq!(
            resolve_placeholders(&xml, &endnotes).unwrap(),
            r#"<w:r><w:endnoteReference w:id="2"/></w:r>"#
        );

        let missing = format!("<w:r>{}</w:r>", endnote_placeholder(7));
        assert!(matches!(
            resolve_placeholders(&missing, &endnotes),
            Err(Error::Encode(_))
        ));
    }

    #[test]
    fn test_placeholder_lookalike_text_is_untouched() {
        let mut endnotes = BTreeMap::new();
        endnotes.insert(1, note("one"));
        let xml = format!(
            r#"<w:r><w:t xml:space="preserve">Syntax: ⟦endnote:9⟧</w:t></w:r><w:r>{}</w:r>"#,
            endnote_placeholder(1)
        );
        assert_eq!(
            resolve_placeholders(&xml, &endnotes).unwrap(),
            r#"<w:r><w:t xml:space="preserve">Syntax: ⟦endnote:9⟧</w:t></w:r><w:r><w:endnoteReference w:id="1"/></w:r>"#
        );
    }

    #[test]
    fn test_endnote_part_declared() {
        let mut model = DocumentModel::with_blocks(vec![Block::paragraph(vec![
            Run::text("Claim"),
            Run::endnote_ref(1),
        ])]);
        model.endnotes.insert(1, note("Source."));
        let bytes = encode(&model, &EncodeOptions::default()).unwrap();

        let container = OoxmlContainer::from_bytes(bytes).unwrap();
        let endnotes = container.read_xml("word/endnotes.xml").unwrap();
        assert!(endnotes.contains(r#"w:type="separator" w:id="-1""#));
        assert!(endnotes.contains(r#"<w:endnote w:id="1">"#));
        let document = container.read_xml("word/document.xml").unwrap();
        assert!(document.contains(r#"<w:endnoteReference w:id="1"/>"#));
        assert!(!document.contains(PLACEHOLDER_OPEN));
        let manifest = container.read_xml("[Content_Types].xml").unwrap();
        assert!(manifest.contains(CT_ENDNOTES));
        let rels = container.read_relationships("word/document.xml").unwrap();
        assert!(rels.has_short_type("endnotes"));
    }

    #[test]
    fn test_reserved_and_dangling_ids_fail() {
        let mut model = DocumentModel::with_blocks(vec![Block::paragraph(vec![Run::text("x")])]);
        model.endnotes.insert(0, note("separator clash"));
        assert!(matches!(
            encode(&model, &EncodeOptions::default()),
            Err(Error::Encode(_))
        ));

        let dangling = DocumentModel::with_blocks(vec![Block::paragraph(vec![
            Run::text("x"),
            Run::endnote_ref(4),
        ])]);
        assert!(matches!(
            encode(&dangling, &EncodeOptions::default()),
            Err(Error::Encode(_))
        ));
    }
}
