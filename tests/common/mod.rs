//! In-memory package fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Base styles: default Normal, two headings and a character style.
pub const BASE_STYLES: &str = r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
<w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/><w:rPr><w:b/></w:rPr></w:style>"#;

/// Builder for a minimal word-processing package.
#[derive(Debug, Clone)]
pub struct Fixture {
    body: String,
    styles: Option<String>,
    numbering: Option<String>,
    /// (id, short type, target, external)
    rels: Vec<(String, String, String, bool)>,
    parts: Vec<(String, Vec<u8>)>,
    main_part: bool,
    content_types: bool,
}

impl Fixture {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            styles: Some(BASE_STYLES.to_string()),
            numbering: None,
            rels: Vec::new(),
            parts: Vec::new(),
            main_part: true,
            content_types: true,
        }
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    pub fn without_main_part(mut self) -> Self {
        self.main_part = false;
        self
    }

    pub fn without_content_types(mut self) -> Self {
        self.content_types = false;
        self
    }

    pub fn with_numbering(mut self, numbering: &str) -> Self {
        self.numbering = Some(numbering.to_string());
        self
    }

    /// Add a relationship of the main part.
    pub fn with_rel(mut self, id: &str, short_type: &str, target: &str, external: bool) -> Self {
        self.rels
            .push((id.to_string(), short_type.to_string(), target.to_string(), external));
        self
    }

    /// Add a raw archive entry.
    pub fn with_part(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push((name.to_string(), data.into()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();

        if self.content_types {
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(
                br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
            )
            .unwrap();
        }

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
                REL_BASE
            )
            .as_bytes(),
        )
        .unwrap();

        let mut rels = Vec::new();
        if self.styles.is_some() {
            rels.push(("rIdStyles".to_string(), "styles".to_string(), "styles.xml".to_string(), false));
        }
        if self.numbering.is_some() {
            rels.push((
                "rIdNumbering".to_string(),
                "numbering".to_string(),
                "numbering.xml".to_string(),
                false,
            ));
        }
        rels.extend(self.rels.iter().cloned());
        let rel_xml: String = rels
            .iter()
            .map(|(id, short, target, external)| {
                format!(
                    r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
                    id,
                    REL_BASE,
                    short,
                    target,
                    if *external { r#" TargetMode="External""# } else { "" }
                )
            })
            .collect();
        zip.start_file("word/_rels/document.xml.rels", options)
            .unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                rel_xml
            )
            .as_bytes(),
        )
        .unwrap();

        if let Some(styles) = &self.styles {
            zip.start_file("word/styles.xml", options).unwrap();
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}">{}</w:styles>"#,
                    W_NS, styles
                )
                .as_bytes(),
            )
            .unwrap();
        }

        if let Some(numbering) = &self.numbering {
            zip.start_file("word/numbering.xml", options).unwrap();
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:numbering xmlns:w="{}">{}</w:numbering>"#,
                    W_NS, numbering
                )
                .as_bytes(),
            )
            .unwrap();
        }

        if self.main_part {
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml(&self.body).as_bytes()).unwrap();
        }

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap();
        buffer
    }
}

/// Wrap body content in a main document part.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, R_NS, body
    )
}

/// A paragraph with one plain run.
pub fn para(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// A 2x1 PNG: signature, IHDR and nothing else.
pub fn tiny_png() -> Vec<u8> {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0, 0, 0, 13]);
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&2u32.to_be_bytes());
    png.extend_from_slice(&1u32.to_be_bytes());
    png.extend_from_slice(&[8, 6, 0, 0, 0]);
    png.extend_from_slice(&[0, 0, 0, 0]);
    png
}

/// A zip with no word-processing content at all.
pub fn plain_zip() -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    zip.start_file("readme.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"not a document").unwrap();
    zip.finish().unwrap();
    buffer
}
