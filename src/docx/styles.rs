//! DOCX style definitions and inheritance resolution.

use crate::error::Result;
use crate::xml::{self, Tag, XmlElement};
use std::collections::{HashMap, HashSet};

/// Style type (paragraph, character, table, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// A parsed style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Style name (e.g., "heading 1")
    pub name: String,
    pub style_type: Option<StyleType>,
    pub based_on: Option<String>,
    pub paragraph_props: ParagraphProps,
    pub run_props: RunProps,
}

/// Paragraph-level properties. Lengths are raw twips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProps {
    pub style_id: Option<String>,
    pub justification: Option<String>,
    pub spacing_before: Option<i64>,
    pub spacing_after: Option<i64>,
    pub line: Option<i64>,
    /// `auto`, `exact` or `atLeast`
    pub line_rule: Option<String>,
    pub indent_left: Option<i64>,
    pub indent_right: Option<i64>,
    pub indent_first_line: Option<i64>,
    pub indent_hanging: Option<i64>,
    pub outline_level: Option<u8>,
    /// (numId, ilvl)
    pub numbering: Option<(String, u8)>,
}

/// Run-level (character) properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub style_id: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub font_ascii: Option<String>,
    pub font_east_asia: Option<String>,
    /// Half-points (`w:sz`)
    pub size: Option<u32>,
    /// Half-points for complex-script and East Asian text (`w:szCs`)
    pub size_cs: Option<u32>,
    /// Bare hex as written, `auto` dropped
    pub color: Option<String>,
    pub highlight: Option<String>,
    pub shading: Option<String>,
    /// `superscript` or `subscript`
    pub vert_align: Option<String>,
}

fn parse_i64(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<f64>().ok()).map(|v| v as i64)
}

impl ParagraphProps {
    /// Read properties from a `w:pPr` element.
    pub fn from_element(ppr: &XmlElement) -> Self {
        let mut props = ParagraphProps::default();
        for child in ppr.elements() {
            match child.name.as_str() {
                "w:pStyle" => props.style_id = child.val().map(str::to_string),
                "w:jc" => props.justification = child.val().map(str::to_string),
                "w:spacing" => {
                    props.spacing_before = parse_i64(child.attr("w:before"));
                    props.spacing_after = parse_i64(child.attr("w:after"));
                    props.line = parse_i64(child.attr("w:line"));
                    props.line_rule = child.attr("w:lineRule").map(str::to_string);
                }
                "w:ind" => {
                    props.indent_left =
                        parse_i64(child.attr("w:left").or_else(|| child.attr("w:start")));
                    props.indent_right =
                        parse_i64(child.attr("w:right").or_else(|| child.attr("w:end")));
                    props.indent_first_line = parse_i64(child.attr("w:firstLine"));
                    props.indent_hanging = parse_i64(child.attr("w:hanging"));
                }
                "w:outlineLvl" => {
                    props.outline_level = child.val().and_then(|v| v.parse().ok());
                }
                "w:numPr" => {
                    let num_id = child
                        .child_named("w:numId")
                        .and_then(|e| e.val())
                        .map(str::to_string);
                    let ilvl = child
                        .child_named("w:ilvl")
                        .and_then(|e| e.val())
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    if let Some(num_id) = num_id {
                        props.numbering = Some((num_id, ilvl));
                    }
                }
                _ => {}
            }
        }
        props
    }

    /// Merge with another ParagraphProps (other takes precedence).
    pub fn merge(&mut self, other: &ParagraphProps) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take!(
            style_id,
            justification,
            spacing_before,
            spacing_after,
            line,
            line_rule,
            indent_left,
            indent_right,
            indent_first_line,
            indent_hanging,
            outline_level,
            numbering
        );
    }
}

impl RunProps {
    /// Read properties from a `w:rPr` element.
    pub fn from_element(rpr: &XmlElement) -> Self {
        let mut props = RunProps::default();
        for child in rpr.elements() {
            match child.name.as_str() {
                "w:rStyle" => props.style_id = child.val().map(str::to_string),
                "w:b" => props.bold = Some(child.on_off()),
                "w:i" => props.italic = Some(child.on_off()),
                "w:u" => props.underline = Some(child.on_off()),
                "w:strike" | "w:dstrike" => {
                    let on = child.on_off();
                    if on || props.strike.is_none() {
                        props.strike = Some(on);
                    }
                }
                "w:rFonts" => {
                    props.font_ascii = child
                        .attr("w:ascii")
                        .or_else(|| child.attr("w:hAnsi"))
                        .map(str::to_string);
                    props.font_east_asia = child.attr("w:eastAsia").map(str::to_string);
                }
                "w:sz" => props.size = child.val().and_then(|v| v.parse().ok()),
                "w:szCs" => props.size_cs = child.val().and_then(|v| v.parse().ok()),
                "w:color" => {
                    props.color = child
                        .val()
                        .filter(|v| !v.eq_ignore_ascii_case("auto"))
                        .map(str::to_string);
                }
                "w:highlight" => {
                    props.highlight = child
                        .val()
                        .filter(|v| !v.eq_ignore_ascii_case("none"))
                        .map(str::to_string);
                }
                "w:shd" => {
                    props.shading = child
                        .attr("w:fill")
                        .filter(|v| !v.eq_ignore_ascii_case("auto"))
                        .map(str::to_string);
                }
                "w:vertAlign" => {
                    props.vert_align = child
                        .val()
                        .filter(|v| *v == "superscript" || *v == "subscript")
                        .map(str::to_string);
                }
                _ => {}
            }
        }
        props
    }

    /// Merge with another RunProps (other takes precedence).
    pub fn merge(&mut self, other: &RunProps) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take!(
            style_id,
            bold,
            italic,
            underline,
            strike,
            font_ascii,
            font_east_asia,
            size,
            size_cs,
            color,
            highlight,
            shading,
            vert_align
        );
    }

    /// Font size in half-points for the given text, preferring `w:szCs`
    /// for CJK text.
    pub fn size_for(&self, cjk: bool) -> Option<u32> {
        if cjk {
            self.size_cs.or(self.size)
        } else {
            self.size.or(self.size_cs)
        }
    }

    /// Font name for the given text, preferring the East Asian face for CJK.
    pub fn font_for(&self, cjk: bool) -> Option<&str> {
        if cjk {
            self.font_east_asia.as_deref().or(self.font_ascii.as_deref())
        } else {
            self.font_ascii.as_deref().or(self.font_east_asia.as_deref())
        }
    }
}

/// The merged result of walking a style chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedProperties {
    pub paragraph: ParagraphProps,
    pub run: RunProps,
    /// Style ids from the root ancestor to the requested style.
    pub chain: Vec<String>,
}

/// Collection of styles from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    /// Styles by ID
    pub styles: HashMap<String, Style>,
    pub default_paragraph: Option<String>,
    pub default_character: Option<String>,
    /// `w:docDefaults/w:rPrDefault`
    pub default_run_props: RunProps,
    /// `w:docDefaults/w:pPrDefault`
    pub default_paragraph_props: ParagraphProps,
}

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(xml_text: &str) -> Result<Self> {
        if xml_text.trim().is_empty() {
            return Ok(Self::default());
        }
        let root = xml::parse(xml_text)?;
        Ok(Self::from_element(&root))
    }

    /// Build from a parsed `w:styles` element.
    pub fn from_element(root: &XmlElement) -> Self {
        let mut map = StyleMap::default();

        if let Some(defaults) = root.child_named("w:docDefaults") {
            if let Some(rpr) = defaults
                .child_named("w:rPrDefault")
                .and_then(|d| d.child(Tag::RunProps))
            {
                map.default_run_props = RunProps::from_element(rpr);
            }
            if let Some(ppr) = defaults
                .child_named("w:pPrDefault")
                .and_then(|d| d.child(Tag::ParagraphProps))
            {
                map.default_paragraph_props = ParagraphProps::from_element(ppr);
            }
        }

        for element in root.elements().filter(|e| e.name == "w:style") {
            let id = match element.attr("w:styleId") {
                Some(id) => id.to_string(),
                None => continue,
            };
            let style_type = match element.attr("w:type") {
                Some("paragraph") => Some(StyleType::Paragraph),
                Some("character") => Some(StyleType::Character),
                Some("table") => Some(StyleType::Table),
                Some("numbering") => Some(StyleType::Numbering),
                _ => None,
            };
            let is_default = matches!(element.attr("w:default"), Some("1") | Some("true"));
            if is_default {
                match style_type {
                    Some(StyleType::Paragraph) => map.default_paragraph = Some(id.clone()),
                    Some(StyleType::Character) => map.default_character = Some(id.clone()),
                    _ => {}
                }
            }

            let style = Style {
                name: element
                    .child_named("w:name")
                    .and_then(|e| e.val())
                    .unwrap_or_default()
                    .to_string(),
                based_on: element
                    .child_named("w:basedOn")
                    .and_then(|e| e.val())
                    .map(str::to_string),
                paragraph_props: element
                    .child(Tag::ParagraphProps)
                    .map(ParagraphProps::from_element)
                    .unwrap_or_default(),
                run_props: element
                    .child(Tag::RunProps)
                    .map(RunProps::from_element)
                    .unwrap_or_default(),
                style_type,
                id: id.clone(),
            };
            map.styles.insert(id, style);
        }

        map
    }

    /// Ancestor chain of a style, root ancestor first.
    ///
    /// The walk follows `basedOn` and stops at a missing reference, an
    /// unknown id, or an id already visited.
    pub fn chain(&self, id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(style_id) = current {
            if !visited.insert(style_id) {
                log::debug!("style inheritance cycle at '{}'", style_id);
                break;
            }
            let Some(style) = self.styles.get(style_id) else {
                break;
            };
            chain.push(style);
            current = style.based_on.as_deref();
        }

        chain.reverse();
        chain
    }

    /// Resolve a style: document defaults, then each ancestor from the root
    /// down to the style itself.
    pub fn resolve(&self, id: &str) -> MergedProperties {
        let mut merged = MergedProperties {
            paragraph: self.default_paragraph_props.clone(),
            run: self.default_run_props.clone(),
            chain: Vec::new(),
        };
        for style in self.chain(id) {
            merged.paragraph.merge(&style.paragraph_props);
            merged.run.merge(&style.run_props);
            merged.chain.push(style.id.clone());
        }
        // Style-level ids describe the chain, not the paragraph.
        merged.paragraph.style_id = merged.chain.last().cloned();
        merged.run.style_id = None;
        merged
    }

    /// Resolve a paragraph's named style, falling back to the default
    /// paragraph style when it names none.
    pub fn resolve_paragraph(&self, style_id: Option<&str>) -> MergedProperties {
        match style_id.or(self.default_paragraph.as_deref()) {
            Some(id) => self.resolve(id),
            None => self.resolve(""),
        }
    }

    /// Effective run properties: defaults, paragraph style, character
    /// style, then direct formatting.
    pub fn resolve_run(
        &self,
        paragraph_style: Option<&str>,
        direct: &RunProps,
    ) -> RunProps {
        let mut run = self.resolve_paragraph(paragraph_style).run;
        let character_style = direct
            .style_id
            .as_deref()
            .or(self.default_character.as_deref());
        if let Some(char_id) = character_style {
            for style in self.chain(char_id) {
                run.merge(&style.run_props);
            }
        }
        run.merge(direct);
        run.style_id = direct.style_id.clone();
        run
    }

    /// Heading level (1-6) for a paragraph style, from its resolved
    /// outline level or its name.
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        let merged = self.resolve(style_id);
        if merged.chain.is_empty() {
            return heading_level_from_name(style_id);
        }
        if let Some(level) = merged.paragraph.outline_level {
            if level < 6 {
                return Some(level + 1);
            }
            return None;
        }
        let name = self
            .styles
            .get(style_id)
            .map(|s| s.name.as_str())
            .unwrap_or(style_id);
        heading_level_from_name(name).or_else(|| heading_level_from_name(style_id))
    }

    /// The display name of a style, if defined.
    pub fn style_name(&self, style_id: &str) -> Option<&str> {
        self.styles.get(style_id).map(|s| s.name.as_str())
    }
}

fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase().replace(' ', "");
    if lower == "title" {
        return Some(1);
    }
    if lower == "subtitle" {
        return Some(2);
    }
    let digits = lower.strip_prefix("heading")?;
    match digits.parse::<u8>() {
        Ok(n) if (1..=6).contains(&n) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:docDefaults>
        <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:eastAsia="宋体"/><w:sz w:val="21"/></w:rPr></w:rPrDefault>
        <w:pPrDefault><w:pPr><w:spacing w:after="160"/></w:pPr></w:pPrDefault>
    </w:docDefaults>
    <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
        <w:name w:val="Normal"/>
        <w:rPr><w:color w:val="333333"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Heading1">
        <w:name w:val="heading 1"/>
        <w:basedOn w:val="Normal"/>
        <w:pPr><w:jc w:val="center"/><w:outlineLvl w:val="0"/></w:pPr>
        <w:rPr><w:b/><w:sz w:val="44"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="RedTitle">
        <w:name w:val="Red Title"/>
        <w:basedOn w:val="Heading1"/>
        <w:rPr><w:color w:val="FF0000"/><w:b w:val="0"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="LoopA">
        <w:basedOn w:val="LoopB"/>
        <w:rPr><w:i/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="LoopB">
        <w:basedOn w:val="LoopA"/>
        <w:rPr><w:u w:val="single"/></w:rPr>
    </w:style>
    <w:style w:type="character" w:styleId="Emphasis">
        <w:name w:val="Emphasis"/>
        <w:rPr><w:i/></w:rPr>
    </w:style>
</w:styles>"#;

    #[test]
    fn test_parse_styles() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.default_paragraph.as_deref(), Some("Normal"));
        let style = map.styles.get("Heading1").unwrap();
        assert_eq!(style.name, "heading 1");
        assert_eq!(style.paragraph_props.outline_level, Some(0));
        assert_eq!(style.run_props.bold, Some(true));
        assert_eq!(style.run_props.size, Some(44));
        assert_eq!(map.default_run_props.size, Some(21));
    }

    #[test]
    fn test_three_level_chain() {
        let map = StyleMap::parse(STYLES).unwrap();
        let merged = map.resolve("RedTitle");
        assert_eq!(merged.chain, vec!["Normal", "Heading1", "RedTitle"]);
        assert_eq!(merged.run.color.as_deref(), Some("FF0000"));
        assert_eq!(merged.run.bold, Some(false));
        assert_eq!(merged.run.size, Some(44));
        assert_eq!(merged.run.font_ascii.as_deref(), Some("Calibri"));
        assert_eq!(merged.paragraph.justification.as_deref(), Some("center"));
        assert_eq!(merged.paragraph.spacing_after, Some(160));
    }

    #[test]
    fn test_cyclic_chain_terminates() {
        let map = StyleMap::parse(STYLES).unwrap();
        let merged = map.resolve("LoopA");
        assert_eq!(merged.chain.len(), 2);
        assert_eq!(merged.run.italic, Some(true));
        assert_eq!(merged.run.underline, Some(true));
    }

    #[test]
    fn test_resolve_run_layers() {
        let map = StyleMap::parse(STYLES).unwrap();
        let direct = RunProps {
            style_id: Some("Emphasis".to_string()),
            color: Some("0000FF".to_string()),
            ..Default::default()
        };
        let run = map.resolve_run(None, &direct);
        assert_eq!(run.italic, Some(true));
        assert_eq!(run.color.as_deref(), Some("0000FF"));
        assert_eq!(run.size, Some(21));
        assert_eq!(run.font_for(true), Some("宋体"));
    }

    #[test]
    fn test_heading_level() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.heading_level("Heading1"), Some(1));
        assert_eq!(map.heading_level("RedTitle"), Some(1));
        assert_eq!(map.heading_level("Normal"), None);
        assert_eq!(map.heading_level("Heading3"), Some(3));
        assert_eq!(map.heading_level("Title"), Some(1));
    }

    #[test]
    fn test_size_prefers_cs_for_cjk() {
        let props = RunProps {
            size: Some(24),
            size_cs: Some(32),
            ..Default::default()
        };
        assert_eq!(props.size_for(true), Some(32));
        assert_eq!(props.size_for(false), Some(24));
    }
}
