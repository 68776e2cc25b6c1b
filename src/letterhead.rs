//! Red-header ("letterhead") front matter.
//!
//! Official documents open with an issuing-authority title in red type
//! separated from the body by a red horizontal rule. The region above the
//! rule is kept as one opaque HTML fragment so editors do not reflow it.
//!
//! Detection runs in two passes:
//! 1. Find the first body child within the scan window that draws a red
//!    rule: a paragraph border, a VML line or rectangle, or a DrawingML
//!    outline.
//! 2. Confirm by counting red text runs in the region up to and including
//!    the rule.

use crate::docx::{block_children, ConvertMode, Converted, Converter, DocxPackage, RunProps};
use crate::html::{blocks_to_html, LETTERHEAD_ATTR};
use crate::model::{Block, LetterheadKind};
use crate::normalize::is_reddish;
use crate::options::{DecodeOptions, LetterheadOptions};
use crate::xml::{Tag, XmlElement};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

const PARTY_KEYWORDS: &[&str] = &["中共", "党委", "党组", "支部"];
const MILITARY_KEYWORDS: &[&str] = &["部队", "军区", "战区", "司令部", "武警"];
const GOVERNMENT_KEYWORDS: &[&str] = &[
    "秘密",
    "机密",
    "绝密",
    "人民政府",
    "国务院",
    "confidential",
    "secret",
    "ministry",
];

/// Why a package has no letterhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Disabled,
    NoBody,
    NoRedRule,
    TooFewRedRuns { found: usize, required: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Disabled => write!(f, "letterhead detection disabled"),
            Rejection::NoBody => write!(f, "document body unavailable"),
            Rejection::NoRedRule => write!(f, "no red rule in the first blocks"),
            Rejection::TooFewRedRuns { found, required } => write!(
                f,
                "{} red text run(s) above the rule, {} required",
                found, required
            ),
        }
    }
}

/// A confirmed letterhead region.
#[derive(Debug)]
pub struct Candidate<'x> {
    pub kind: LetterheadKind,
    /// Body children up to and including the rule.
    pub region: Vec<&'x XmlElement>,
    /// Remaining body children.
    pub rest: Vec<&'x XmlElement>,
    pub red_runs: usize,
}

/// Converted letterhead document.
#[derive(Debug)]
pub struct Extraction {
    pub kind: LetterheadKind,
    pub converted: Converted,
}

/// Locate and confirm a letterhead.
pub fn detect<'x>(
    pkg: &'x DocxPackage,
    options: &LetterheadOptions,
) -> Result<Candidate<'x>, Rejection> {
    if !options.enabled {
        return Err(Rejection::Disabled);
    }
    let body = pkg.body().ok_or(Rejection::NoBody)?;
    let children = block_children(body);

    let rule = children
        .iter()
        .take(options.max_scan_blocks)
        .position(|el| draws_red_rule(el, options))
        .ok_or(Rejection::NoRedRule)?;

    let region = children[..=rule].to_vec();
    let red_runs = count_red_runs(pkg, &region, options);
    if red_runs < options.min_red_runs.max(1) {
        return Err(Rejection::TooFewRedRuns {
            found: red_runs,
            required: options.min_red_runs.max(1),
        });
    }

    let text: String = region
        .iter()
        .map(|el| el.text_content())
        .collect::<Vec<_>>()
        .join("\n");
    let kind = classify(&text);
    log::debug!(
        "letterhead candidate: {} region blocks, {} red runs, {:?}",
        region.len(),
        red_runs,
        kind
    );

    Ok(Candidate {
        kind,
        region,
        rest: children[rule + 1..].to_vec(),
        red_runs,
    })
}

/// Convert a package whose front matter is a letterhead.
pub fn extract(pkg: &DocxPackage, options: &DecodeOptions) -> Result<Extraction, Rejection> {
    let candidate = detect(pkg, &options.letterhead)?;
    let mut converter = Converter::new(pkg, ConvertMode::Styled, &options.headings);

    let head = converter.convert_elements(&pkg.main, &candidate.region);
    let html = format!(
        r#"<div {}="{}">{}</div>"#,
        LETTERHEAD_ATTR,
        candidate.kind.as_str(),
        blocks_to_html(&head)
    );
    let mut blocks = vec![Block::RawHtml { html }];
    blocks.extend(converter.convert_elements(&pkg.main, &candidate.rest));

    Ok(Extraction {
        kind: candidate.kind,
        converted: converter.finish(blocks, options.include_header_footer),
    })
}

/// Classify letterhead text by issuing-authority keywords.
///
/// Text is NFKC-folded first, so full-width Latin matches too. Latin
/// keywords match whole words; CJK keywords match anywhere.
pub fn classify(text: &str) -> LetterheadKind {
    let lower = text.nfkc().collect::<String>().to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let matches = |keyword: &&str| {
        if keyword.is_ascii() {
            words.contains(keyword)
        } else {
            lower.contains(*keyword)
        }
    };
    let any = |keywords: &[&str]| keywords.iter().any(matches);
    if any(PARTY_KEYWORDS) {
        LetterheadKind::Party
    } else if any(MILITARY_KEYWORDS) {
        LetterheadKind::Military
    } else if any(GOVERNMENT_KEYWORDS) {
        LetterheadKind::Government
    } else {
        LetterheadKind::Custom
    }
}

/// Whether a body child draws a red horizontal rule.
pub fn draws_red_rule(element: &XmlElement, options: &LetterheadOptions) -> bool {
    let red = |color: Option<&str>| {
        color.is_some_and(|c| is_reddish(c, options.min_red, options.max_green_blue))
    };

    let border = element
        .child(Tag::ParagraphProps)
        .and_then(|ppr| ppr.child_named("w:pBdr"))
        .is_some_and(|bdr| {
            bdr.elements()
                .filter(|side| matches!(side.local_name(), "top" | "bottom" | "between"))
                .filter(|side| !matches!(side.val(), Some("none" | "nil")))
                .any(|side| red(side.attr("w:color")))
        });
    if border {
        return true;
    }

    let vml = ["v:line", "v:rect"].iter().any(|name| {
        element
            .find_all_named(name)
            .into_iter()
            .any(|shape| red(shape.attr("strokecolor")) || red(shape.attr("fillcolor")))
    });
    if vml {
        return true;
    }

    element.find_all_named("a:ln").into_iter().any(|line| {
        line.find_named("a:srgbClr")
            .is_some_and(|clr| red(clr.attr("val")))
    })
}

/// Red, non-blank text runs within the given body children.
fn count_red_runs(pkg: &DocxPackage, region: &[&XmlElement], options: &LetterheadOptions) -> usize {
    let mut count = 0;
    for element in region {
        let paragraphs = if element.tag == Tag::Paragraph {
            vec![*element]
        } else {
            element.find_all(Tag::Paragraph)
        };
        for paragraph in paragraphs {
            let style = paragraph
                .child(Tag::ParagraphProps)
                .and_then(|ppr| ppr.child_named("w:pStyle"))
                .and_then(|s| s.val());
            for run in paragraph.find_all(Tag::Run) {
                let text: String = run
                    .find_all(Tag::Text)
                    .iter()
                    .map(|t| t.text_content())
                    .collect();
                if text.trim().is_empty() {
                    continue;
                }
                let direct = run
                    .child(Tag::RunProps)
                    .map(RunProps::from_element)
                    .unwrap_or_default();
                let resolved = pkg.styles.resolve_run(style, &direct);
                if resolved
                    .color
                    .as_deref()
                    .is_some_and(|c| is_reddish(c, options.min_red, options.max_green_blue))
                {
                    count += 1;
                }
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_TITLE: &str = r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:color w:val="FF0000"/><w:sz w:val="44"/></w:rPr><w:t>XX市人民政府办公室文件</w:t></w:r></w:p>"#;
    const BLACK_TITLE: &str =
        r#"<w:p><w:r><w:t>Annual report</w:t></w:r></w:p>"#;
    const RED_RULE: &str = r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="24" w:color="E00000"/></w:pBdr></w:pPr></w:p>"#;
    const BODY: &str = r#"<w:p><w:r><w:t>Body text.</w:t></w:r></w:p>"#;

    #[test]
    fn test_red_title_over_red_rule_is_government() {
        let pkg = DocxPackage::from_body(&format!("{}{}{}", RED_TITLE, RED_RULE, BODY), "");
        let candidate = detect(&pkg, &LetterheadOptions::default()).unwrap();
        assert_eq!(candidate.kind, LetterheadKind::Government);
        assert_eq!(candidate.region.len(), 2);
        assert_eq!(candidate.rest.len(), 1);
        assert_eq!(candidate.red_runs, 1);
    }

    #[test]
    fn test_red_rule_without_red_text_is_rejected() {
        let pkg = DocxPackage::from_body(&format!("{}{}{}", BLACK_TITLE, RED_RULE, BODY), "");
        assert_eq!(
            detect(&pkg, &LetterheadOptions::default()).unwrap_err(),
            Rejection::TooFewRedRuns {
                found: 0,
                required: 1
            }
        );
    }

    #[test]
    fn test_no_rule() {
        let pkg = DocxPackage::from_body(&format!("{}{}", RED_TITLE, BODY), "");
        assert_eq!(
            detect(&pkg, &LetterheadOptions::default()).unwrap_err(),
            Rejection::NoRedRule
        );
    }

    #[test]
    fn test_red_from_character_style() {
        let styles = r#"<w:style w:type="character" w:styleId="RedHead"><w:rPr><w:color w:val="CC0000"/></w:rPr></w:style>"#;
        let title = r#"<w:p><w:r><w:rPr><w:rStyle w:val="RedHead"/></w:rPr><w:t>中共XX委员会</w:t></w:r></w:p>"#;
        let pkg = DocxPackage::from_body(&format!("{}{}{}", title, RED_RULE, BODY), styles);
        let candidate = detect(&pkg, &LetterheadOptions::default()).unwrap();
        assert_eq!(candidate.kind, LetterheadKind::Party);
    }

    #[test]
    fn test_vml_and_drawingml_rules() {
        let options = LetterheadOptions::default();
        let vml = crate::xml::parse(
            r#"<w:p><w:r><w:pict><v:line from="0,0" to="400pt,0" strokecolor="red"/></w:pict></w:r></w:p>"#,
        )
        .unwrap();
        assert!(draws_red_rule(&vml, &options));

        let dml = crate::xml::parse(
            r#"<w:p><w:r><w:drawing><wps:spPr><a:ln w="28575"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:ln></wps:spPr></w:drawing></w:r></w:p>"#,
        )
        .unwrap();
        assert!(draws_red_rule(&dml, &options));

        let blue = crate::xml::parse(
            r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:color="0000FF"/></w:pBdr></w:pPr></w:p>"#,
        )
        .unwrap();
        assert!(!draws_red_rule(&blue, &options));
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(classify("中共XX市委 机密"), LetterheadKind::Party);
        assert_eq!(classify("XX战区司令部"), LetterheadKind::Military);
        assert_eq!(classify("Ministry of Finance"), LetterheadKind::Government);
        assert_eq!(classify("Acme Corp"), LetterheadKind::Custom);
        assert_eq!(classify("ＳＥＣＲＥＴ"), LetterheadKind::Government);
    }

    #[test]
    fn test_latin_keywords_match_whole_words() {
        assert_eq!(classify("TOP SECRET"), LetterheadKind::Government);
        assert_eq!(classify("Confidential: internal"), LetterheadKind::Government);
        assert_eq!(classify("Office of the Secretary"), LetterheadKind::Custom);
        assert_eq!(classify("Secretariat Bulletin"), LetterheadKind::Custom);
        assert_eq!(classify("Ministryof Things"), LetterheadKind::Custom);
        assert_eq!(classify("XX省人民政府办公厅"), LetterheadKind::Government);
    }

    #[test]
    fn test_extract_wraps_region() {
        let pkg = DocxPackage::from_body(&format!("{}{}{}", RED_TITLE, RED_RULE, BODY), "");
        let extraction = extract(&pkg, &DecodeOptions::default()).unwrap();
        let blocks = &extraction.converted.blocks;
        assert_eq!(blocks.len(), 2);
        let Block::RawHtml { html } = &blocks[0] else {
            panic!("expected letterhead fragment");
        };
        assert!(html.starts_with(r#"<div data-letterhead="government">"#));
        assert!(html.contains("人民政府"));
        assert_eq!(blocks[1].plain_text(), "Body text.");
    }
}
