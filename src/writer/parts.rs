//! Fixed package parts: manifest, relationships, styles, numbering,
//! core properties and part roots.

use crate::container::Relationships;
use crate::normalize::east_asian_name;
use crate::options::EncodeOptions;
use crate::xml::{escape_attr, escape_text};
use std::collections::BTreeSet;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Namespace declarations shared by every WordprocessingML part root.
pub(crate) const WORD_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) const CT_DOCUMENT: &str = crate::detect::DOCX_MAIN_CONTENT_TYPE;
pub(crate) const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub(crate) const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub(crate) const CT_FOOTNOTES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
pub(crate) const CT_ENDNOTES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
pub(crate) const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub(crate) const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Full relationship type URI for a short type name.
pub(crate) fn rel_type(short: &str) -> String {
    format!("{}/{}", REL_BASE, short)
}

/// `[Content_Types].xml` for the given part overrides and media
/// extensions (with their MIME types).
pub(crate) fn content_types(
    overrides: &[(&str, &str)],
    media: &BTreeSet<(String, String)>,
) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push_str(&format!(
        r#"<Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/>"#,
        CT_RELS
    ));
    for (extension, mime) in media {
        out.push_str(&default_content_type(extension, mime));
    }
    out.push_str(&format!(
        r#"<Override PartName="/docProps/core.xml" ContentType="{}"/>"#,
        CT_CORE
    ));
    for (part, content_type) in overrides {
        out.push_str(&override_content_type(part, content_type));
    }
    out.push_str("</Types>");
    out
}

pub(crate) fn default_content_type(extension: &str, mime: &str) -> String {
    format!(
        r#"<Default Extension="{}" ContentType="{}"/>"#,
        escape_attr(extension),
        escape_attr(mime)
    )
}

pub(crate) fn override_content_type(part: &str, content_type: &str) -> String {
    format!(
        r#"<Override PartName="/{}" ContentType="{}"/>"#,
        escape_attr(part),
        content_type
    )
}

/// Package-level `_rels/.rels`.
pub(crate) fn package_relationships() -> String {
    format!(
        concat!(
            "{}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            "</Relationships>"
        ),
        XML_DECLARATION, REL_BASE
    )
}

/// Serialize a part's relationships, ordered by numeric id.
pub(crate) fn relationships_xml(rels: &Relationships) -> String {
    let mut sorted: Vec<_> = rels.by_id.values().collect();
    sorted.sort_by_key(|rel| {
        rel.id
            .strip_prefix("rId")
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(u32::MAX)
    });

    let mut out = String::from(XML_DECLARATION);
    out.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in sorted {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            escape_attr(&rel.id),
            escape_attr(&rel.rel_type),
            escape_attr(&rel.target),
            if rel.external {
                r#" TargetMode="External""#
            } else {
                ""
            }
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// `docProps/core.xml` with an optional title.
pub(crate) fn core_properties(title: Option<&str>) -> String {
    let title = title
        .map(|t| format!("<dc:title>{}</dc:title>", escape_text(t)))
        .unwrap_or_default();
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "{}<dc:creator>wordloom</dc:creator></cp:coreProperties>"
        ),
        XML_DECLARATION, title
    )
}

/// Wrap part content in its root element (`w:document` bodies are
/// wrapped by the caller).
pub(crate) fn part_root(root: &str, content: &str) -> String {
    format!(
        "{}<{} {}>{}</{}>",
        XML_DECLARATION, root, WORD_NAMESPACES, content, root
    )
}

/// Separator and continuation separator notes, ids -1 and 0.
pub(crate) fn note_separators(kind: &str) -> String {
    format!(
        concat!(
            r#"<w:{0} w:type="separator" w:id="-1"><w:p><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:r><w:separator/></w:r></w:p></w:{0}>"#,
            r#"<w:{0} w:type="continuationSeparator" w:id="0"><w:p><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:r><w:continuationSeparator/></w:r></w:p></w:{0}>"#
        ),
        kind
    )
}

const HEADING_SIZES: [u32; 6] = [44, 32, 28, 24, 22, 20];

/// `word/styles.xml`.
pub(crate) fn styles(options: &EncodeOptions) -> String {
    let font = escape_attr(&options.font_family);
    let east_asian = escape_attr(
        east_asian_name(&options.east_asian_font).unwrap_or(&options.east_asian_font),
    );
    let size = (options.font_size_pt * 2.0).round().max(2.0) as u32;

    let mut out = String::from(XML_DECLARATION);
    out.push_str(&format!(
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{1}" w:cs="{0}"/><w:sz w:val="{2}"/><w:szCs w:val="{2}"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>"#,
        font, east_asian, size
    ));
    out.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);
    out.push_str(r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/></w:style>"#);

    for (i, half_points) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        let before = if level <= 2 { 240 } else { 160 };
        out.push_str(&format!(
            r#"<w:style w:type="paragraph" w:styleId="Heading{0}"><w:name w:val="heading {0}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="{1}" w:after="120"/><w:outlineLvl w:val="{2}"/></w:pPr><w:rPr><w:b/><w:sz w:val="{3}"/><w:szCs w:val="{3}"/></w:rPr></w:style>"#,
            level, before, i, half_points
        ));
    }

    out.push_str(r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="Code"><w:name w:val="Code"/><w:basedOn w:val="Normal"/><w:pPr><w:shd w:val="clear" w:color="auto" w:fill="F5F5F5"/><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:rPr><w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:eastAsia="Consolas" w:cs="Consolas"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:style>"#);
    out.push_str(r#"<w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr><w:ind w:left="720" w:right="720"/></w:pPr></w:style>"#);
    out.push_str(r#"<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:basedOn w:val="DefaultParagraphFont"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>"#);
    out.push_str(r#"<w:style w:type="character" w:styleId="FootnoteReference"><w:name w:val="footnote reference"/><w:basedOn w:val="DefaultParagraphFont"/><w:rPr><w:vertAlign w:val="superscript"/></w:rPr></w:style>"#);
    out.push_str(r#"<w:style w:type="character" w:styleId="EndnoteReference"><w:name w:val="endnote reference"/><w:basedOn w:val="DefaultParagraphFont"/><w:rPr><w:vertAlign w:val="superscript"/></w:rPr></w:style>"#);
    out.push_str("</w:styles>");
    out
}

/// Abstract numbering id of bullet lists.
pub(crate) const BULLET_ABSTRACT: u32 = 0;
/// Abstract numbering id of ordered lists.
pub(crate) const ORDERED_ABSTRACT: u32 = 1;

/// Five list levels.
pub(crate) const LIST_LEVELS: u8 = 5;

const BULLET_GLYPHS: [&str; 5] = ["•", "◦", "▪", "•", "◦"];
const ORDERED_FORMATS: [&str; 5] = ["decimal", "lowerLetter", "lowerRoman", "decimal", "lowerLetter"];

/// A concrete numbering instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumInstance {
    pub num_id: u32,
    pub abstract_id: u32,
    /// (level, start) override
    pub start: Option<(u8, u32)>,
}

/// `word/numbering.xml`: one bullet and one ordered abstract definition,
/// plus the given instances.
pub(crate) fn numbering(instances: &[NumInstance]) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push_str(r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#);

    out.push_str(&format!(
        r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="hybridMultilevel"/>"#,
        BULLET_ABSTRACT
    ));
    for (level, glyph) in BULLET_GLYPHS.iter().enumerate() {
        out.push_str(&format!(
            r#"<w:lvl w:ilvl="{}"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/>{}</w:lvl>"#,
            level,
            glyph,
            level_indent(level)
        ));
    }
    out.push_str("</w:abstractNum>");

    out.push_str(&format!(
        r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="hybridMultilevel"/>"#,
        ORDERED_ABSTRACT
    ));
    for (level, format) in ORDERED_FORMATS.iter().enumerate() {
        out.push_str(&format!(
            r#"<w:lvl w:ilvl="{0}"><w:start w:val="1"/><w:numFmt w:val="{1}"/><w:lvlText w:val="%{2}."/><w:lvlJc w:val="left"/>{3}</w:lvl>"#,
            level,
            format,
            level + 1,
            level_indent(level)
        ));
    }
    out.push_str("</w:abstractNum>");

    for instance in instances {
        out.push_str(&format!(
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="{}"/>"#,
            instance.num_id, instance.abstract_id
        ));
        if let Some((level, start)) = instance.start {
            out.push_str(&format!(
                r#"<w:lvlOverride w:ilvl="{}"><w:startOverride w:val="{}"/></w:lvlOverride>"#,
                level, start
            ));
        }
        out.push_str("</w:num>");
    }
    out.push_str("</w:numbering>");
    out
}

fn level_indent(level: usize) -> String {
    format!(
        r#"<w:pPr><w:ind w:left="{}" w:hanging="360"/></w:pPr>"#,
        720 * (level + 1)
    )
}

/// `w:sectPr` for the body: page size, margins and header/footer
/// references.
pub(crate) fn section_properties(
    options: &EncodeOptions,
    header: Option<&str>,
    footer: Option<&str>,
) -> String {
    let mut out = String::from("<w:sectPr>");
    if let Some(id) = header {
        out.push_str(&format!(
            r#"<w:headerReference w:type="default" r:id="{}"/>"#,
            id
        ));
    }
    if let Some(id) = footer {
        out.push_str(&format!(
            r#"<w:footerReference w:type="default" r:id="{}"/>"#,
            id
        ));
    }
    out.push_str(&format!(
        r#"<w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr>"#,
        options.page_width_twips,
        options.page_height_twips,
        options.margin_top_twips,
        options.margin_right_twips,
        options.margin_bottom_twips,
        options.margin_left_twips
    ));
    out
}
