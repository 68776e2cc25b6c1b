//! Decoding pipeline.
//!
//! ```text
//! Sniff -> Validate -> Attempt(strategy) -> Validate-result -> Accept
//!                          ^                      |
//!                          +---- NextStrategy <---+--> Exhausted
//! ```
//!
//! HTML and MHTML inputs go straight to the mapper. Packages are loaded
//! once and handed to each strategy in priority order. A result is
//! accepted when it has content and either carries inline styling or no
//! higher-fidelity strategy is left to try. A style-free result is kept as
//! a pending fallback and accepted before the pipeline drops to a
//! lower-fidelity strategy.

mod legacy;
pub mod mhtml;
mod strategy;

pub use legacy::salvage_paragraphs;
pub use strategy::{
    DecodeStrategy, HighFidelity, Legacy, Redhead, StrategyKind, StrategyOutput, StrategyResult,
    Structured,
};

use crate::container::decode_xml_bytes;
use crate::detect::{ensure_supported, sniff, FormatType};
use crate::docx::DocxPackage;
use crate::error::{Error, Result};
use crate::html::{from_html, has_style_signal, to_html};
use crate::model::{DocumentModel, Metadata};
use crate::options::DecodeOptions;

/// Decoded HTML and model; diagnostics live in `model.metadata`.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub html: String,
    pub model: DocumentModel,
}

/// Decode a buffer.
///
/// Fails only for unsupported formats and for packages the reader rejects
/// as corrupt; strategy failures end up in the metadata warnings.
pub fn decode(data: &[u8], file_name: Option<&str>, options: &DecodeOptions) -> Result<Decoded> {
    let sniffed = sniff(data, file_name);
    ensure_supported(sniffed.format)?;
    log::debug!("decoding {} bytes as {:?}", data.len(), sniffed.format);

    let mut metadata = Metadata::for_input(sniffed.format, file_name, data.len() as u64);
    metadata.extend_warnings(sniffed.warnings);

    match sniffed.format {
        FormatType::PackagedXml => decode_package(data, options, metadata),
        FormatType::Html => {
            let text =
                decode_xml_bytes(data).unwrap_or_else(|_| String::from_utf8_lossy(data).into_owned());
            decode_html(&text, metadata, "html")
        }
        FormatType::Mhtml => {
            let text = mhtml::unpack(data)?;
            decode_html(&text, metadata, "mhtml")
        }
        other => Err(Error::UnsupportedFormat(other.name().to_string())),
    }
}

/// Decode on the blocking thread pool.
#[cfg(feature = "async")]
pub async fn decode_async(
    data: Vec<u8>,
    file_name: Option<String>,
    options: DecodeOptions,
) -> Result<Decoded> {
    tokio::task::spawn_blocking(move || decode(&data, file_name.as_deref(), &options))
        .await
        .map_err(|e| Error::InvalidData(format!("decode task failed: {}", e)))?
}

fn decode_html(text: &str, mut metadata: Metadata, method: &str) -> Result<Decoded> {
    let mut model = from_html(text)?;
    metadata.method = Some(method.to_string());
    metadata.image_count = model.count_images();
    model.metadata = metadata;
    Ok(Decoded {
        html: to_html(&model),
        model,
    })
}

fn decode_package(data: &[u8], options: &DecodeOptions, mut metadata: Metadata) -> Result<Decoded> {
    let pkg = DocxPackage::read(data)?;
    for flag in &pkg.corruption {
        metadata.push_warning(format!("corrupt package: {}", flag));
        metadata.flag(flag.clone());
    }
    metadata.entries = pkg.entries.clone();
    metadata.title = pkg.core.title.clone();
    metadata.author = pkg.core.author.clone();

    let mut orchestrator = Orchestrator::new(&pkg, options);
    let large = options.offload_large_files && pkg.size > options.large_file_threshold;

    let accepted = if large && options.strategies.contains(&StrategyKind::Structured) {
        // Letterheads are extracted in process before anything is offloaded.
        let letterhead = if options.strategies.contains(&StrategyKind::Redhead) {
            orchestrator.run(&strategies_for(&[StrategyKind::Redhead]))
        } else {
            None
        };
        match letterhead.or_else(|| orchestrator.offload()) {
            Some(accepted) => Some(accepted),
            None => {
                let order: Vec<StrategyKind> = options
                    .strategies
                    .contains(&StrategyKind::HighFidelity)
                    .then_some(StrategyKind::HighFidelity)
                    .into_iter()
                    .chain(options.strategies.iter().copied().filter(|k| {
                        !matches!(
                            k,
                            StrategyKind::Redhead
                                | StrategyKind::Structured
                                | StrategyKind::HighFidelity
                        )
                    }))
                    .collect();
                orchestrator.run(&strategies_for(&order))
            }
        }
    } else {
        orchestrator.run(&strategies_for(&options.strategies))
    };

    let warnings = orchestrator.into_warnings();
    Ok(finish(accepted, metadata, warnings))
}

fn strategies_for(kinds: &[StrategyKind]) -> Vec<&'static dyn DecodeStrategy> {
    kinds.iter().map(StrategyKind::strategy).collect()
}

fn finish(
    accepted: Option<(StrategyKind, StrategyOutput)>,
    mut metadata: Metadata,
    warnings: Vec<String>,
) -> Decoded {
    metadata.extend_warnings(warnings);

    let Some((kind, output)) = accepted else {
        metadata.push_warning("all decoding strategies exhausted");
        log::warn!("all decoding strategies exhausted");
        return Decoded {
            html: String::new(),
            model: DocumentModel {
                metadata,
                ..Default::default()
            },
        };
    };

    log::info!("decoded with {} strategy", kind);
    metadata.extend_warnings(output.warnings);
    let mut model = match from_html(&output.html) {
        Ok(model) => model,
        Err(e) => {
            metadata.push_warning(format!("mapper failed, keeping converter output: {}", e));
            output.model
        }
    };
    metadata.method = Some(kind.name().to_string());
    metadata.letterhead = output.letterhead;
    metadata.image_count = model.count_images();
    model.metadata = metadata;

    Decoded {
        html: output.html,
        model,
    }
}

/// How a produced result is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Accept,
    /// Usable but worth improving on.
    Defer(&'static str),
    Reject(&'static str),
}

fn judge(kind: StrategyKind, output: &StrategyOutput, remaining: &[&dyn DecodeStrategy]) -> Verdict {
    if output.model.is_empty() {
        return Verdict::Reject("empty result");
    }
    let higher_remains = remaining
        .iter()
        .any(|s| s.kind().fidelity() > kind.fidelity());
    if has_style_signal(&output.html) || !higher_remains {
        Verdict::Accept
    } else {
        Verdict::Defer("no style signal")
    }
}

enum State {
    Attempt(usize),
    Validate(usize, StrategyOutput),
    Accept(StrategyKind, StrategyOutput),
    Exhausted,
}

/// Runs strategies over one package and owns the accumulated warnings.
pub struct Orchestrator<'a> {
    pkg: &'a DocxPackage,
    options: &'a DecodeOptions,
    warnings: Vec<String>,
    pending: Option<(StrategyKind, StrategyOutput)>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(pkg: &'a DocxPackage, options: &'a DecodeOptions) -> Self {
        Self {
            pkg,
            options,
            warnings: Vec::new(),
            pending: None,
        }
    }

    /// Try strategies in order until one is accepted.
    pub fn run(&mut self, strategies: &[&dyn DecodeStrategy]) -> Option<(StrategyKind, StrategyOutput)> {
        let mut state = State::Attempt(0);
        loop {
            state = match state {
                State::Attempt(index) => self.attempt(strategies, index),
                State::Validate(index, output) => {
                    let kind = strategies[index].kind();
                    match judge(kind, &output, &strategies[index + 1..]) {
                        Verdict::Accept => State::Accept(kind, output),
                        Verdict::Defer(reason) => {
                            log::info!("{} result deferred: {}", kind, reason);
                            if self.pending.is_none() {
                                self.pending = Some((kind, output));
                            }
                            State::Attempt(index + 1)
                        }
                        Verdict::Reject(reason) => {
                            self.reject(kind, reason);
                            State::Attempt(index + 1)
                        }
                    }
                }
                State::Accept(kind, output) => return Some((kind, output)),
                State::Exhausted => return None,
            };
        }
    }

    fn attempt(&mut self, strategies: &[&dyn DecodeStrategy], index: usize) -> State {
        let Some(strategy) = strategies.get(index) else {
            return match self.pending.take() {
                Some((kind, output)) => State::Accept(kind, output),
                None => State::Exhausted,
            };
        };
        let kind = strategy.kind();

        if self
            .pending
            .as_ref()
            .is_some_and(|(pending, _)| kind.fidelity() < pending.fidelity())
        {
            if let Some((pending, output)) = self.pending.take() {
                log::info!("accepting deferred {} result before {}", pending, kind);
                return State::Accept(pending, output);
            }
        }

        if !strategy.applies(self.pkg, self.options) {
            log::debug!("{} strategy does not apply", kind);
            return State::Attempt(index + 1);
        }

        log::debug!("attempting {} strategy", kind);
        match strategy.attempt(self.pkg, self.options) {
            StrategyResult::Accepted(output) => State::Validate(index, output),
            StrategyResult::Rejected(reason) => {
                self.reject(kind, &reason);
                State::Attempt(index + 1)
            }
        }
    }

    fn reject(&mut self, kind: StrategyKind, reason: &str) {
        let message = if kind == StrategyKind::Redhead && self.pkg.has_alt_chunk {
            format!(
                "alternate-format chunk present but letterhead rejected: {}",
                reason
            )
        } else {
            format!("{} strategy rejected: {}", kind, reason)
        };
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    /// The semantic conversion on a worker thread. Returns the result when
    /// it is acceptable; otherwise records why and keeps any content as the
    /// pending fallback.
    pub fn offload(&mut self) -> Option<(StrategyKind, StrategyOutput)> {
        let (pkg, options) = (self.pkg, self.options);
        let joined = std::thread::scope(|scope| -> Result<StrategyResult> {
            let handle = std::thread::Builder::new()
                .name("wordloom-decode".to_string())
                .spawn_scoped(scope, || Structured.attempt(pkg, options))?;
            handle
                .join()
                .map_err(|_| Error::InvalidData("offloaded decode panicked".to_string()))
        });

        let output = match joined {
            Ok(StrategyResult::Accepted(output)) => output,
            Ok(StrategyResult::Rejected(reason)) => {
                self.reject(StrategyKind::Structured, &reason);
                return None;
            }
            Err(e) => {
                self.reject(StrategyKind::Structured, &e.to_string());
                return None;
            }
        };

        if output.model.is_empty() {
            self.reject(StrategyKind::Structured, "empty result");
            return None;
        }
        if output.model.count_images() == 0 && pkg.size >= options.image_plausible_size {
            let message = format!(
                "offloaded decode found no images in a {}-byte package; retrying in process",
                pkg.size
            );
            log::warn!("{}", message);
            self.warnings.push(message);
            self.pending = Some((StrategyKind::Structured, output));
            return None;
        }
        Some((StrategyKind::Structured, output))
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Run, RunStyle};

    struct Canned {
        kind: StrategyKind,
        html: Option<&'static str>,
    }

    impl DecodeStrategy for Canned {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn attempt(&self, _pkg: &DocxPackage, _options: &DecodeOptions) -> StrategyResult {
            match self.html {
                Some(html) => StrategyResult::Accepted(StrategyOutput {
                    html: html.to_string(),
                    model: from_html(html).unwrap(),
                    warnings: Vec::new(),
                    letterhead: None,
                }),
                None => StrategyResult::Rejected("canned failure".to_string()),
            }
        }
    }

    fn pkg() -> DocxPackage {
        DocxPackage::from_body("", "")
    }

    const PLAIN: &str = "<p>plain</p>";
    const STYLED: &str = r#"<p style="text-align: center">styled</p>"#;

    #[test]
    fn test_style_free_result_yields_to_styled() {
        let pkg = pkg();
        let options = DecodeOptions::default();
        let first = Canned {
            kind: StrategyKind::Structured,
            html: Some(PLAIN),
        };
        let second = Canned {
            kind: StrategyKind::HighFidelity,
            html: Some(STYLED),
        };
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        let (kind, output) = orchestrator.run(&[&first, &second]).unwrap();
        assert_eq!(kind, StrategyKind::HighFidelity);
        assert_eq!(output.html, STYLED);
        assert!(orchestrator.into_warnings().is_empty());
    }

    #[test]
    fn test_pending_accepted_before_lower_fidelity() {
        let pkg = pkg();
        let options = DecodeOptions::default();
        let structured = Canned {
            kind: StrategyKind::Structured,
            html: Some(PLAIN),
        };
        let failing = Canned {
            kind: StrategyKind::HighFidelity,
            html: None,
        };
        let legacy = Canned {
            kind: StrategyKind::Legacy,
            html: Some(STYLED),
        };
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        let (kind, _) = orchestrator.run(&[&structured, &failing, &legacy]).unwrap();
        assert_eq!(kind, StrategyKind::Structured);
        assert_eq!(
            orchestrator.into_warnings(),
            vec!["high_fidelity strategy rejected: canned failure".to_string()]
        );
    }

    #[test]
    fn test_style_free_accepted_when_nothing_better_remains() {
        let pkg = pkg();
        let options = DecodeOptions::default();
        let only = Canned {
            kind: StrategyKind::HighFidelity,
            html: Some(PLAIN),
        };
        let legacy = Canned {
            kind: StrategyKind::Legacy,
            html: None,
        };
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        let (kind, _) = orchestrator.run(&[&only, &legacy]).unwrap();
        assert_eq!(kind, StrategyKind::HighFidelity);
    }

    #[test]
    fn test_exhaustion_collects_every_reason() {
        let pkg = pkg();
        let options = DecodeOptions::default();
        let empty = Canned {
            kind: StrategyKind::Structured,
            html: Some("<p> </p>"),
        };
        let failing = Canned {
            kind: StrategyKind::Legacy,
            html: None,
        };
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        assert!(orchestrator.run(&[&empty, &failing]).is_none());
        assert_eq!(orchestrator.into_warnings().len(), 2);
    }

    #[test]
    fn test_real_strategies_on_styled_package() {
        let pkg = DocxPackage::from_body(
            r#"<w:p><w:r><w:rPr><w:color w:val="336699"/></w:rPr><w:t>Blue</w:t></w:r></w:p>"#,
            "",
        );
        let options = DecodeOptions::default();
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        let (kind, output) = orchestrator
            .run(&strategies_for(&options.strategies))
            .unwrap();
        assert_eq!(kind, StrategyKind::HighFidelity);
        let expected = Block::paragraph(vec![Run::styled(
            "Blue",
            RunStyle {
                color: Some("#336699".to_string()),
                ..Default::default()
            },
        )]);
        assert_eq!(output.model.blocks, vec![expected]);
    }

    #[test]
    fn test_malformed_main_part_salvaged() {
        let mut pkg = DocxPackage::from_body("", "");
        pkg.main.xml = "<w:document><w:body><w:p><w:r><w:t>Kept</w:t></w:r></w:p><w:p>".to_string();
        pkg.main.tree = None;
        let options = DecodeOptions::default();
        let mut orchestrator = Orchestrator::new(&pkg, &options);
        let (kind, output) = orchestrator
            .run(&strategies_for(&options.strategies))
            .unwrap();
        assert_eq!(kind, StrategyKind::Legacy);
        assert_eq!(output.model.plain_text(), "Kept");
        assert_eq!(orchestrator.into_warnings().len(), 2);
    }

    #[test]
    fn test_decode_html_input() {
        let decoded = decode(
            b"<!DOCTYPE html><html><body><h1>Title</h1></body></html>",
            Some("page.html"),
            &DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(decoded.model.blocks, vec![Block::heading(1, vec![Run::text("Title")])]);
        assert_eq!(decoded.model.metadata.method.as_deref(), Some("html"));
        assert_eq!(decoded.html, "<h1>Title</h1>");
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_decode_async_matches_sync() {
        let data = b"<p>Offloaded</p>".to_vec();
        let sync = decode(&data, None, &DecodeOptions::default()).unwrap();
        let decoded = decode_async(data, None, DecodeOptions::default())
            .await
            .unwrap();
        assert_eq!(decoded.html, sync.html);
    }

    #[test]
    fn test_decode_rejects_legacy_binary() {
        let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        data.extend_from_slice(&[0; 64]);
        let err = decode(&data, Some("old.doc"), &DecodeOptions::default()).unwrap_err();
        assert!(err.is_unsupported_format());
    }
}
