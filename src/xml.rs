//! Typed XML tree for WordprocessingML parts.
//!
//! A part is parsed once with quick-xml into [`XmlElement`] nodes. Each
//! element carries a [`Tag`] classified from its qualified name so the
//! converters can match on structure instead of comparing strings.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};

/// Element kinds the converters care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Body,
    Paragraph,
    ParagraphProps,
    Run,
    RunProps,
    Text,
    InstrText,
    DeletedText,
    Tab,
    Break,
    CarriageReturn,
    Hyperlink,
    Drawing,
    Inline,
    Anchor,
    Pict,
    Object,
    ImageData,
    Blip,
    DocProps,
    Extent,
    Table,
    TableProps,
    TableGrid,
    GridCol,
    Row,
    Cell,
    CellProps,
    FootnoteReference,
    EndnoteReference,
    NoteRefMark,
    Note,
    SectionProps,
    AlternateContent,
    Choice,
    Fallback,
    FieldSimple,
    FieldChar,
    SdtProps,
    /// Wrappers whose children belong to the enclosing container
    /// (`w:ins`, `w:smartTag`, `w:sdt`, `w:sdtContent`, `w:customXml`).
    Transparent,
    /// Removed content (`w:del`, `w:moveFrom`).
    Deleted,
    Other,
}

impl Tag {
    /// Classify a qualified element name.
    pub fn from_name(name: &str) -> Tag {
        match name {
            "w:body" => Tag::Body,
            "w:p" => Tag::Paragraph,
            "w:pPr" => Tag::ParagraphProps,
            "w:r" => Tag::Run,
            "w:rPr" => Tag::RunProps,
            "w:t" => Tag::Text,
            "w:instrText" => Tag::InstrText,
            "w:delText" => Tag::DeletedText,
            "w:tab" => Tag::Tab,
            "w:br" => Tag::Break,
            "w:cr" => Tag::CarriageReturn,
            "w:hyperlink" => Tag::Hyperlink,
            "w:drawing" => Tag::Drawing,
            "wp:inline" => Tag::Inline,
            "wp:anchor" => Tag::Anchor,
            "w:pict" => Tag::Pict,
            "w:object" => Tag::Object,
            "v:imagedata" => Tag::ImageData,
            "a:blip" => Tag::Blip,
            "wp:docPr" => Tag::DocProps,
            "wp:extent" => Tag::Extent,
            "w:tbl" => Tag::Table,
            "w:tblPr" => Tag::TableProps,
            "w:tblGrid" => Tag::TableGrid,
            "w:gridCol" => Tag::GridCol,
            "w:tr" => Tag::Row,
            "w:tc" => Tag::Cell,
            "w:tcPr" => Tag::CellProps,
            "w:footnoteReference" => Tag::FootnoteReference,
            "w:endnoteReference" => Tag::EndnoteReference,
            "w:footnoteRef" | "w:endnoteRef" => Tag::NoteRefMark,
            "w:footnote" | "w:endnote" => Tag::Note,
            "w:sectPr" => Tag::SectionProps,
            "mc:AlternateContent" => Tag::AlternateContent,
            "mc:Choice" => Tag::Choice,
            "mc:Fallback" => Tag::Fallback,
            "w:fldSimple" => Tag::FieldSimple,
            "w:fldChar" => Tag::FieldChar,
            "w:sdtPr" | "w:sdtEndPr" => Tag::SdtProps,
            "w:ins" | "w:smartTag" | "w:sdt" | "w:sdtContent" | "w:customXml" | "w:moveTo" => {
                Tag::Transparent
            }
            "w:del" | "w:moveFrom" => Tag::Deleted,
            _ => Tag::Other,
        }
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written (e.g. `w:p`).
    pub name: String,
    pub tag: Tag,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            tag: Tag::from_name(&name),
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Local part of the name (`pBdr` for `w:pBdr`).
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attribute value by qualified name, falling back to local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        if let Some((_, v)) = self.attrs.iter().find(|(k, _)| k == key) {
            return Some(v);
        }
        let wanted = local(key);
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// `w:val` shorthand.
    pub fn val(&self) -> Option<&str> {
        self.attr("w:val")
    }

    /// Toggle property semantics: present without `w:val` means on.
    pub fn on_off(&self) -> bool {
        !matches!(
            self.val(),
            Some("0") | Some("false") | Some("off") | Some("none")
        )
    }

    /// Element children in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: Tag) -> Option<&XmlElement> {
        self.elements().find(|e| e.tag == tag)
    }

    /// First direct child with the given qualified name.
    pub fn child_named(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// First descendant (depth-first) with the given tag.
    pub fn find(&self, tag: Tag) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// First descendant (depth-first) with the given qualified name.
    pub fn find_named(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_named(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given tag, in document order.
    pub fn find_all(&self, tag: Tag) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect(&|e: &XmlElement| e.tag == tag, &mut out);
        out
    }

    /// All descendants with the given qualified name, in document order.
    pub fn find_all_named(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect(&|e: &XmlElement| e.name == name, &mut out);
        out
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&XmlElement) -> bool, out: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if pred(child) {
                out.push(child);
            }
            child.collect(pred, out);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.push_text(out),
            }
        }
    }
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map(|v| v.to_string())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
        element.attrs.push((key, value));
    }
    Ok(element)
}

/// Whether whitespace-only text is significant inside this element.
fn keeps_whitespace(parent: &XmlElement) -> bool {
    matches!(parent.tag, Tag::Text | Tag::InstrText | Tag::DeletedText)
}

/// Parse an XML document into its root element.
pub fn parse(xml: &str) -> Result<XmlElement> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from_start(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from_start(e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::XmlParse("unbalanced end tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlParse(err.to_string()))?
                        .to_string();
                    if keeps_whitespace(parent) || !text.trim().is_empty() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(Error::XmlParse(format!(
            "unclosed element <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }
    root.ok_or_else(|| Error::XmlParse("document has no root element".to_string()))
}

/// Escape text for inclusion in XML or HTML character data.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for inclusion in a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
