//! Package writer.
//!
//! [`encode`] serializes a [`DocumentModel`] into a word-processing
//! package: manifest, relationships, styles, numbering, the main document,
//! footnotes, header and footer parts, and media. Endnote references are
//! written as placeholders and resolved by a second pass over the finished
//! zip (see [`patch`]) that adds the endnotes part.

mod body;
mod parts;
mod patch;

pub use patch::add_endnotes;

use crate::container::{Relationship, Relationships};
use crate::error::Result;
use crate::model::DocumentModel;
use crate::options::EncodeOptions;
use body::{BlockWriter, ListNumbering, NumberingPlan, Resources};
use parts::{
    content_types, core_properties, note_separators, package_relationships, part_root, rel_type,
    relationships_xml, section_properties, CT_DOCUMENT, CT_FOOTER, CT_FOOTNOTES, CT_HEADER,
    CT_NUMBERING, CT_STYLES, WORD_NAMESPACES, XML_DECLARATION,
};
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Media type of a word-processing package.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Serialize a model into package bytes.
pub fn encode(model: &DocumentModel, options: &EncodeOptions) -> Result<Vec<u8>> {
    let built = build(model, options)?;
    if model.endnotes.is_empty() && built.endnote_refs.is_empty() {
        return Ok(built.bytes);
    }
    add_endnotes(built.bytes, &model.endnotes, options)
}

struct Built {
    bytes: Vec<u8>,
    /// Endnote ids referenced anywhere in the written parts
    endnote_refs: BTreeSet<u32>,
}

/// A secondary part written with its own relationships.
struct WrittenPart {
    xml: String,
    rels: Relationships,
}

fn write_part(
    options: &EncodeOptions,
    numbering: &mut dyn ListNumbering,
    resources: &mut Resources,
    endnote_refs: &mut BTreeSet<u32>,
    write: impl FnOnce(&mut BlockWriter<'_>),
) -> WrittenPart {
    let mut writer = BlockWriter::new(options, numbering, resources, Relationships::new());
    write(&mut writer);
    endnote_refs.extend(writer.endnote_refs.iter().copied());
    WrittenPart {
        xml: writer.take(),
        rels: writer.rels,
    }
}

fn build(model: &DocumentModel, options: &EncodeOptions) -> Result<Built> {
    let mut numbering = NumberingPlan::new();
    let mut resources = Resources::new(1, 1);
    let mut endnote_refs = BTreeSet::new();

    let mut doc_rels = Relationships::new();
    for (id, short, target) in [
        ("rId1", "styles", "styles.xml"),
        ("rId2", "numbering", "numbering.xml"),
        ("rId3", "footnotes", "footnotes.xml"),
    ] {
        doc_rels.add(Relationship {
            id: id.to_string(),
            rel_type: rel_type(short),
            target: target.to_string(),
            external: false,
        });
    }

    let mut section_parts = Vec::new();
    for (kind, root, blocks) in [
        ("header", "w:hdr", &model.header),
        ("footer", "w:ftr", &model.footer),
    ] {
        let Some(blocks) = blocks.as_ref().filter(|b| !b.is_empty()) else {
            continue;
        };
        let part = write_part(options, &mut numbering, &mut resources, &mut endnote_refs, |w| {
            w.write_blocks(blocks)
        });
        let id = doc_rels.next_id();
        doc_rels.add(Relationship {
            id: id.clone(),
            rel_type: rel_type(kind),
            target: format!("{}1.xml", kind),
            external: false,
        });
        section_parts.push((kind, id, part_root(root, &part.xml), part.rels));
    }

    let footnotes = write_part(options, &mut numbering, &mut resources, &mut endnote_refs, |w| {
        w.write_notes("footnote", "FootnoteReference", &model.footnotes)
    });

    let (body, doc_rels) = {
        let mut writer = BlockWriter::new(options, &mut numbering, &mut resources, doc_rels);
        writer.write_blocks(&model.blocks);
        endnote_refs.extend(writer.endnote_refs.iter().copied());
        (writer.take(), writer.rels)
    };

    let rel_of = |kind: &str| {
        section_parts
            .iter()
            .find(|(k, ..)| *k == kind)
            .map(|(_, id, ..)| id.as_str())
    };
    let document = format!(
        "{}<w:document {}><w:body>{}{}</w:body></w:document>",
        XML_DECLARATION,
        WORD_NAMESPACES,
        body,
        section_properties(options, rel_of("header"), rel_of("footer"))
    );

    let mut overrides = vec![
        ("word/document.xml", CT_DOCUMENT),
        ("word/styles.xml", CT_STYLES),
        ("word/numbering.xml", CT_NUMBERING),
        ("word/footnotes.xml", CT_FOOTNOTES),
    ];
    let section_names: Vec<String> = section_parts
        .iter()
        .map(|(kind, ..)| format!("word/{}1.xml", kind))
        .collect();
    for ((kind, ..), name) in section_parts.iter().zip(&section_names) {
        let content_type = if *kind == "header" { CT_HEADER } else { CT_FOOTER };
        overrides.push((name.as_str(), content_type));
    }

    let title = options.title.as_deref().or(model.metadata.title.as_deref());
    let mut entries: Vec<(String, Vec<u8>)> = vec![
        (
            "[Content_Types].xml".to_string(),
            content_types(&overrides, &resources.extensions()).into_bytes(),
        ),
        ("_rels/.rels".to_string(), package_relationships().into_bytes()),
        ("docProps/core.xml".to_string(), core_properties(title).into_bytes()),
        ("word/document.xml".to_string(), document.into_bytes()),
        (
            "word/_rels/document.xml.rels".to_string(),
            relationships_xml(&doc_rels).into_bytes(),
        ),
        ("word/styles.xml".to_string(), parts::styles(options).into_bytes()),
        (
            "word/numbering.xml".to_string(),
            parts::numbering(&numbering.instances).into_bytes(),
        ),
        (
            "word/footnotes.xml".to_string(),
            part_root(
                "w:footnotes",
                &format!("{}{}", note_separators("footnote"), footnotes.xml),
            )
            .into_bytes(),
        ),
    ];
    if !footnotes.rels.is_empty() {
        entries.push((
            "word/_rels/footnotes.xml.rels".to_string(),
            relationships_xml(&footnotes.rels).into_bytes(),
        ));
    }
    for ((kind, _, xml, rels), name) in section_parts.into_iter().zip(section_names) {
        if !rels.is_empty() {
            entries.push((
                format!("word/_rels/{}1.xml.rels", kind),
                relationships_xml(&rels).into_bytes(),
            ));
        }
        entries.push((name, xml.into_bytes()));
    }
    for media in resources.media {
        entries.push((media.path, media.data));
    }

    log::debug!(
        "encoding package: {} entries, {} list instance(s)",
        entries.len(),
        numbering.instances.len()
    );
    Ok(Built {
        bytes: write_zip(&entries)?,
        endnote_refs,
    })
}

/// Zip entries in order; media is stored, everything else deflated.
pub(crate) fn write_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    for (name, data) in entries {
        let options = if name.starts_with("word/media/") {
            stored
        } else {
            deflated
        };
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }
    zip.finish()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::OoxmlContainer;
    use crate::docx::DocxPackage;
    use crate::model::{Block, Run};

    #[test]
    fn test_package_layout() {
        let mut model = DocumentModel::with_blocks(vec![Block::paragraph(vec![Run::text("Body")])]);
        model.header = Some(vec![Block::paragraph(vec![Run::text("Head")])]);
        let bytes = encode(&model, &EncodeOptions::default().with_title("Report")).unwrap();

        let container = OoxmlContainer::from_bytes(bytes.clone()).unwrap();
        for part in [
            "[Content_Types].xml",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/footnotes.xml",
            "word/header1.xml",
        ] {
            assert!(container.exists(part), "missing {}", part);
        }
        assert!(!container.exists("word/endnotes.xml"));
        assert!(!container.exists("word/footer1.xml"));
        let manifest = container.read_xml("[Content_Types].xml").unwrap();
        assert!(manifest.contains(r#"PartName="/word/header1.xml""#));
        assert!(manifest.contains(crate::detect::DOCX_MAIN_CONTENT_TYPE));
        assert_eq!(
            crate::detect::detect_format_from_bytes(&bytes),
            crate::detect::FormatType::PackagedXml
        );

        let pkg = DocxPackage::read(&bytes).unwrap();
        assert!(pkg.corruption.is_empty());
        assert!(pkg.header.is_some());
        assert_eq!(pkg.core.title.as_deref(), Some("Report"));
    }

    #[test]
    fn test_media_is_stored() {
        let entries = vec![
            ("word/document.xml".to_string(), b"<w:document/>".to_vec()),
            ("word/media/image1.png".to_string(), vec![0x89, b'P', b'N', b'G']),
        ];
        let bytes = write_zip(&entries).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(
            archive.by_name("word/media/image1.png").unwrap().compression(),
            CompressionMethod::Stored
        );
        assert_eq!(
            archive.by_name("word/document.xml").unwrap().compression(),
            CompressionMethod::Deflated
        );
    }
}
