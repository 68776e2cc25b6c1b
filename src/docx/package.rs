//! Word-processing package reader.
//!
//! Opens the zip container once, validates the parts every package must
//! have, and loads everything the converters need into owned memory: the
//! main document, styles, numbering, notes, default header/footer, their
//! relationships and the media they reference. The loaded package holds no
//! archive handle, so it can be shared with a worker thread.

use super::numbering::NumberingMap;
use super::styles::StyleMap;
use crate::container::{is_utf16, CoreProperties, OoxmlContainer, Relationships};
use crate::error::{Error, Result};
use crate::model::CorruptionFlag;
use crate::xml::{self, Tag, XmlElement};
use std::collections::HashMap;

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// A loaded XML part with its relationships.
#[derive(Debug, Clone)]
pub struct Part {
    pub path: String,
    pub xml: String,
    /// Parsed tree; `None` when the XML is malformed.
    pub tree: Option<XmlElement>,
    pub rels: Relationships,
}

impl Part {
    /// The `w:body` element of a main document part.
    pub fn body(&self) -> Option<&XmlElement> {
        self.tree.as_ref()?.child(Tag::Body)
    }
}

/// Media bytes resolved through a relationship.
#[derive(Debug, Clone, Copy)]
pub struct MediaRef<'a> {
    pub path: &'a str,
    pub data: &'a [u8],
}

/// A validated, fully loaded package.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    pub main: Part,
    pub styles: StyleMap,
    pub numbering: NumberingMap,
    pub footnotes: Option<Part>,
    pub endnotes: Option<Part>,
    pub header: Option<Part>,
    pub footer: Option<Part>,
    /// Media bytes by resolved package path
    pub media: HashMap<String, Vec<u8>>,
    /// Raw entry names in archive order
    pub entries: Vec<String>,
    pub corruption: Vec<CorruptionFlag>,
    pub core: CoreProperties,
    /// An alternate-format chunk is attached to the main part.
    pub has_alt_chunk: bool,
    /// Size of the input buffer in bytes
    pub size: u64,
}

impl DocxPackage {
    /// Open and validate a package.
    pub fn read(data: &[u8]) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data.to_vec())
            .map_err(|e| Error::CorruptPackage(format!("unreadable zip container: {}", e)))?;
        let entries = container.list_files();
        let mut corruption = Vec::new();

        let content_types = container
            .read_binary("[Content_Types].xml")
            .map_err(|_| Error::CorruptPackage("missing [Content_Types].xml".to_string()))?;
        if is_utf16(&content_types) {
            flag(&mut corruption, CorruptionFlag::Utf16Parts);
        }

        let package_rels = container
            .read_package_relationships()
            .unwrap_or_default();
        let main_path = package_rels
            .find_short_type("officeDocument")
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .filter(|path| container.exists(path))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        if !container.exists(&main_path) {
            return Err(Error::CorruptPackage(format!("missing {}", main_path)));
        }

        let main = load_part(&container, &main_path, &mut corruption)
            .ok_or_else(|| Error::CorruptPackage(format!("unreadable {}", main_path)))?;
        if !container.exists(&OoxmlContainer::rels_path_for(&main_path)) {
            flag(&mut corruption, CorruptionFlag::MissingDocumentRelationships);
        }

        let styles = match related_part(&container, &main, "styles", "word/styles.xml") {
            Some(path) => match load_part(&container, &path, &mut corruption) {
                Some(part) => part
                    .tree
                    .as_ref()
                    .map(StyleMap::from_element)
                    .unwrap_or_default(),
                None => StyleMap::default(),
            },
            None => {
                flag(&mut corruption, CorruptionFlag::MissingStyles);
                StyleMap::default()
            }
        };

        let numbering = related_part(&container, &main, "numbering", "word/numbering.xml")
            .and_then(|path| load_part(&container, &path, &mut corruption))
            .and_then(|part| part.tree.as_ref().map(NumberingMap::from_element))
            .unwrap_or_default();

        let footnotes = related_part(&container, &main, "footnotes", "word/footnotes.xml")
            .and_then(|path| load_part(&container, &path, &mut corruption));
        let endnotes = related_part(&container, &main, "endnotes", "word/endnotes.xml")
            .and_then(|path| load_part(&container, &path, &mut corruption));

        let header = section_part(&container, &main, "headerReference", "header")
            .and_then(|path| load_part(&container, &path, &mut corruption));
        let footer = section_part(&container, &main, "footerReference", "footer")
            .and_then(|path| load_part(&container, &path, &mut corruption));

        let mut media = HashMap::new();
        let parts = [
            Some(&main),
            footnotes.as_ref(),
            endnotes.as_ref(),
            header.as_ref(),
            footer.as_ref(),
        ];
        for part in parts.into_iter().flatten() {
            for rel in part.rels.by_id.values() {
                if rel.external || !rel.is_type("image") {
                    continue;
                }
                let path = OoxmlContainer::resolve_path(&part.path, &rel.target);
                if media.contains_key(&path) {
                    continue;
                }
                match container.read_binary(&path) {
                    Ok(bytes) => {
                        media.insert(path, bytes);
                    }
                    Err(e) => {
                        log::warn!("cannot read media {}: {}", path, e);
                        flag(&mut corruption, CorruptionFlag::UnreadableEntry(path));
                    }
                }
            }
        }

        let has_alt_chunk = main.rels.has_short_type("aFChunk");
        let core = container.parse_core_properties();

        log::debug!(
            "package loaded: {} entries, {} media, {} corruption flags",
            entries.len(),
            media.len(),
            corruption.len()
        );

        Ok(Self {
            main,
            styles,
            numbering,
            footnotes,
            endnotes,
            header,
            footer,
            media,
            entries,
            corruption,
            core,
            has_alt_chunk,
            size: data.len() as u64,
        })
    }

    /// Resolve an image relationship of a part to its bytes.
    pub fn media_for<'a>(&'a self, part: &'a Part, rel_id: &str) -> Result<MediaRef<'a>> {
        let rel = part
            .rels
            .get(rel_id)
            .ok_or_else(|| Error::MissingComponent(format!("relationship {}", rel_id)))?;
        if rel.external {
            return Err(Error::InvalidData(format!(
                "image {} is linked externally to {}",
                rel_id, rel.target
            )));
        }
        let path = OoxmlContainer::resolve_path(&part.path, &rel.target);
        let (path, data) = self
            .media
            .get_key_value(&path)
            .ok_or(Error::MissingComponent(path))?;
        Ok(MediaRef { path, data })
    }

    /// Target of a hyperlink relationship of a part.
    pub fn hyperlink_target<'a>(&self, part: &'a Part, rel_id: &str) -> Option<&'a str> {
        part.rels.get(rel_id).map(|r| r.target.as_str())
    }

    /// The `w:body` of the main document, when it parsed.
    pub fn body(&self) -> Option<&XmlElement> {
        self.main.body()
    }

    /// Number of image relationships across loaded parts.
    pub fn media_count(&self) -> usize {
        self.media.len()
    }
}

fn flag(flags: &mut Vec<CorruptionFlag>, new: CorruptionFlag) {
    if !flags.contains(&new) {
        flags.push(new);
    }
}

fn load_part(
    container: &OoxmlContainer,
    path: &str,
    corruption: &mut Vec<CorruptionFlag>,
) -> Option<Part> {
    let bytes = match container.read_binary(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("cannot read part {}: {}", path, e);
            flag(corruption, CorruptionFlag::UnreadableEntry(path.to_string()));
            return None;
        }
    };
    if is_utf16(&bytes) {
        flag(corruption, CorruptionFlag::Utf16Parts);
    }
    let xml_text = match crate::container::decode_xml_bytes(&bytes) {
        Ok(text) => text,
        Err(_) => {
            flag(corruption, CorruptionFlag::UnreadableEntry(path.to_string()));
            return None;
        }
    };
    let tree = match xml::parse(&xml_text) {
        Ok(tree) => Some(tree),
        Err(e) => {
            log::warn!("malformed XML in {}: {}", path, e);
            flag(corruption, CorruptionFlag::MalformedXml(path.to_string()));
            None
        }
    };
    let rels = container.read_relationships(path).unwrap_or_else(|e| {
        log::warn!("malformed relationships for {}: {}", path, e);
        flag(
            corruption,
            CorruptionFlag::MalformedXml(OoxmlContainer::rels_path_for(path)),
        );
        Relationships::new()
    });

    Some(Part {
        path: path.to_string(),
        xml: xml_text,
        tree,
        rels,
    })
}

/// Path of a part related to the main document by type, falling back to
/// the conventional location.
fn related_part(
    container: &OoxmlContainer,
    main: &Part,
    short_type: &str,
    fallback: &str,
) -> Option<String> {
    if let Some(rel) = main.rels.find_short_type(short_type) {
        let path = OoxmlContainer::resolve_path(&main.path, &rel.target);
        if container.exists(&path) {
            return Some(path);
        }
    }
    container.exists(fallback).then(|| fallback.to_string())
}

/// Default header or footer of the last section, falling back to the first
/// related part of that type.
fn section_part(
    container: &OoxmlContainer,
    main: &Part,
    reference: &str,
    short_type: &str,
) -> Option<String> {
    let reference_name = format!("w:{}", reference);
    let rel_id = main
        .body()
        .and_then(|body| body.find_all(Tag::SectionProps).into_iter().last())
        .and_then(|sect| {
            sect.elements()
                .filter(|e| e.name == reference_name)
                .find(|e| e.attr("w:type").unwrap_or("default") == "default")
                .and_then(|e| e.attr("r:id"))
                .map(str::to_string)
        });

    let rel = match rel_id {
        Some(id) => main.rels.get(&id),
        None => main.rels.find_short_type(short_type),
    }?;
    let path = OoxmlContainer::resolve_path(&main.path, &rel.target);
    container.exists(&path).then_some(path)
}

#[cfg(test)]
impl DocxPackage {
    /// An in-memory package around a main document body and a styles
    /// part, both given without their root elements.
    pub(crate) fn from_body(body: &str, styles: &str) -> Self {
        const NS: &str = r#"xmlns:w="w" xmlns:r="r""#;
        let document = format!(r#"<w:document {}><w:body>{}</w:body></w:document>"#, NS, body);
        let styles = StyleMap::parse(&format!("<w:styles {}>{}</w:styles>", NS, styles))
            .unwrap_or_default();
        DocxPackage {
            main: Part {
                path: DEFAULT_MAIN_PART.to_string(),
                tree: xml::parse(&document).ok(),
                xml: document,
                rels: Relationships::new(),
            },
            styles,
            numbering: NumberingMap::default(),
            footnotes: None,
            endnotes: None,
            header: None,
            footer: None,
            media: HashMap::new(),
            entries: Vec::new(),
            corruption: Vec::new(),
            core: CoreProperties::default(),
            has_alt_chunk: false,
            size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn build(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, content) in entries {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
    const PACKAGE_RELS: &[u8] = br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
    const DOCUMENT: &[u8] = br#"<?xml version="1.0"?><w:document xmlns:w="w" xmlns:r="r"><w:body><w:p><w:r><w:t>Hi</w:t></w:r></w:p><w:sectPr><w:headerReference w:type="default" r:id="rId5"/></w:sectPr></w:body></w:document>"#;
    const DOCUMENT_RELS: &[u8] = br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/><Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="chunk.mht"/></Relationships>"#;

    #[test]
    fn test_read_minimal_package() {
        let data = build(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", PACKAGE_RELS),
            ("word/document.xml", DOCUMENT),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
            ("word/media/image1.png", b"\x89PNG-bytes"),
            ("word/header1.xml", br#"<w:hdr xmlns:w="w"><w:p><w:r><w:t>Head</w:t></w:r></w:p></w:hdr>"#),
        ]);
        let pkg = DocxPackage::read(&data).unwrap();
        assert_eq!(pkg.main.path, "word/document.xml");
        assert!(pkg.body().is_some());
        assert_eq!(pkg.entries.len(), 6);
        assert!(pkg.has_alt_chunk);
        assert_eq!(pkg.corruption, vec![CorruptionFlag::MissingStyles]);
        assert_eq!(pkg.header.as_ref().unwrap().path, "word/header1.xml");
        let media = pkg.media_for(&pkg.main, "rId2").unwrap();
        assert_eq!(media.path, "word/media/image1.png");
        assert!(pkg.media_for(&pkg.main, "rId404").is_err());
    }

    #[test]
    fn test_missing_document_part_is_corrupt() {
        let data = build(&[("[Content_Types].xml", CONTENT_TYPES), ("word/styles.xml", b"<w:styles/>")]);
        let err = DocxPackage::read(&data).unwrap_err();
        assert!(err.is_corrupt_package());
    }

    #[test]
    fn test_missing_content_types_is_corrupt() {
        let data = build(&[("word/document.xml", DOCUMENT)]);
        assert!(DocxPackage::read(&data).unwrap_err().is_corrupt_package());
    }

    #[test]
    fn test_unreadable_zip_is_corrupt() {
        let mut data = b"PK\x03\x04".to_vec();
        data.extend_from_slice(&[0u8; 40]);
        assert!(DocxPackage::read(&data).unwrap_err().is_corrupt_package());
    }

    #[test]
    fn test_malformed_document_flagged() {
        let data = build(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("word/document.xml", b"<w:document><w:body><w:p></w:body>"),
        ]);
        let pkg = DocxPackage::read(&data).unwrap();
        assert!(pkg.main.tree.is_none());
        assert!(pkg
            .corruption
            .contains(&CorruptionFlag::MalformedXml("word/document.xml".to_string())));
        assert!(pkg
            .corruption
            .contains(&CorruptionFlag::MissingDocumentRelationships));
    }
}
