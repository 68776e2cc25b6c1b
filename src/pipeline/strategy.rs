//! Decoding strategies.

use super::legacy::salvage_paragraphs;
use crate::docx::{ConvertMode, Converter, DocxPackage};
use crate::html::to_html;
use crate::letterhead;
use crate::model::{DocumentModel, LetterheadKind};
use crate::options::DecodeOptions;
use serde::{Deserialize, Serialize};

/// Strategies in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Letterhead extraction; applies only to letterhead candidates.
    Redhead,
    /// Semantic-only conversion.
    Structured,
    /// Full style-resolved conversion.
    HighFidelity,
    /// Text salvage from the raw main part.
    Legacy,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Redhead,
        StrategyKind::Structured,
        StrategyKind::HighFidelity,
        StrategyKind::Legacy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Redhead => "redhead",
            StrategyKind::Structured => "structured",
            StrategyKind::HighFidelity => "high_fidelity",
            StrategyKind::Legacy => "legacy",
        }
    }

    /// Relative output fidelity; higher keeps more formatting.
    pub fn fidelity(&self) -> u8 {
        match self {
            StrategyKind::Redhead | StrategyKind::HighFidelity => 2,
            StrategyKind::Structured => 1,
            StrategyKind::Legacy => 0,
        }
    }

    /// The strategy implementation.
    pub fn strategy(&self) -> &'static dyn DecodeStrategy {
        match self {
            StrategyKind::Redhead => &Redhead,
            StrategyKind::Structured => &Structured,
            StrategyKind::HighFidelity => &HighFidelity,
            StrategyKind::Legacy => &Legacy,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a strategy produced.
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    /// Intermediate HTML
    pub html: String,
    /// The model the HTML was rendered from.
    pub model: DocumentModel,
    pub warnings: Vec<String>,
    pub letterhead: Option<LetterheadKind>,
}

impl StrategyOutput {
    fn from_model(model: DocumentModel, warnings: Vec<String>) -> Self {
        Self {
            html: to_html(&model),
            model,
            warnings,
            letterhead: None,
        }
    }
}

/// Outcome of one strategy attempt.
#[derive(Debug, Clone)]
pub enum StrategyResult {
    Accepted(StrategyOutput),
    Rejected(String),
}

/// One way of decoding a loaded package.
pub trait DecodeStrategy: Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the strategy is worth attempting for this package.
    fn applies(&self, _pkg: &DocxPackage, _options: &DecodeOptions) -> bool {
        true
    }

    fn attempt(&self, pkg: &DocxPackage, options: &DecodeOptions) -> StrategyResult;
}

pub struct Redhead;

impl DecodeStrategy for Redhead {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Redhead
    }

    fn applies(&self, pkg: &DocxPackage, options: &DecodeOptions) -> bool {
        options.letterhead.enabled
            && (pkg.has_alt_chunk || letterhead::detect(pkg, &options.letterhead).is_ok())
    }

    fn attempt(&self, pkg: &DocxPackage, options: &DecodeOptions) -> StrategyResult {
        match letterhead::extract(pkg, options) {
            Ok(extraction) => {
                let (model, warnings) = extraction.converted.into_model();
                let mut output = StrategyOutput::from_model(model, warnings);
                output.letterhead = Some(extraction.kind);
                StrategyResult::Accepted(output)
            }
            Err(rejection) => StrategyResult::Rejected(rejection.to_string()),
        }
    }
}

pub struct Structured;

impl DecodeStrategy for Structured {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Structured
    }

    fn attempt(&self, pkg: &DocxPackage, options: &DecodeOptions) -> StrategyResult {
        convert(pkg, options, ConvertMode::Semantic)
    }
}

pub struct HighFidelity;

impl DecodeStrategy for HighFidelity {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HighFidelity
    }

    fn attempt(&self, pkg: &DocxPackage, options: &DecodeOptions) -> StrategyResult {
        convert(pkg, options, ConvertMode::Styled)
    }
}

pub struct Legacy;

impl DecodeStrategy for Legacy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Legacy
    }

    fn attempt(&self, pkg: &DocxPackage, _options: &DecodeOptions) -> StrategyResult {
        let blocks = salvage_paragraphs(&pkg.main.xml);
        if blocks.is_empty() {
            return StrategyResult::Rejected("no text found in the main part".to_string());
        }
        let warnings = vec![format!(
            "salvaged {} paragraph(s) as plain text from {}",
            blocks.len(),
            pkg.main.path
        )];
        StrategyResult::Accepted(StrategyOutput::from_model(
            DocumentModel::with_blocks(blocks),
            warnings,
        ))
    }
}

fn convert(pkg: &DocxPackage, options: &DecodeOptions, mode: ConvertMode) -> StrategyResult {
    let converter = Converter::new(pkg, mode, &options.headings);
    match converter.convert(options.include_header_footer) {
        Ok(converted) => {
            let (model, warnings) = converted.into_model();
            StrategyResult::Accepted(StrategyOutput::from_model(model, warnings))
        }
        Err(e) => StrategyResult::Rejected(e.to_string()),
    }
}
