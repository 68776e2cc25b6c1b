//! Decoding pipeline behavior on whole inputs.

mod common;

use common::{para, plain_zip, Fixture};
use wordloom::model::CorruptionFlag;
use wordloom::{
    decode, decode_with_options, sniff, Block, DecodeOptions, Error, FormatType, Run, StrategyKind,
};

#[test]
fn test_sniffer_classifies_inputs() {
    let docx = Fixture::new(&para("Hello")).build();
    assert_eq!(sniff(&docx, None).format, FormatType::PackagedXml);
    assert_eq!(sniff(&plain_zip(), None).format, FormatType::Unknown);
    assert_eq!(
        sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0], None).format,
        FormatType::LegacyBinary
    );
    assert_eq!(sniff(b"<!DOCTYPE html><p>x</p>", None).format, FormatType::Html);
    assert_eq!(
        sniff(b"MIME-Version: 1.0\r\nContent-Type: multipart/related; boundary=x\r\n\r\n", None).format,
        FormatType::Mhtml
    );
    assert_eq!(sniff(b"{\\rtf1 hi}", None).format, FormatType::Rtf);
    assert_eq!(sniff(b"plain words", None).format, FormatType::Unknown);
}

#[test]
fn test_disguised_name_is_a_warning() {
    let docx = Fixture::new(&para("Hello")).build();
    let decoded = decode_with_options(&docx, Some("report.doc"), &DecodeOptions::default()).unwrap();
    assert!(decoded
        .model
        .metadata
        .warnings()
        .iter()
        .any(|w| w.contains("disguised")));
    assert_eq!(decoded.model.plain_text(), "Hello");
}

#[test]
fn test_unsupported_formats_are_distinguished() {
    for input in [
        plain_zip(),
        b"{\\rtf1\\ansi text}".to_vec(),
        vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0],
    ] {
        let err = decode(&input).unwrap_err();
        assert!(err.is_unsupported_format(), "{}", err);
    }
}

#[test]
fn test_package_without_document_part_is_corrupt() {
    let bytes = Fixture::new("").without_main_part().build();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::CorruptPackage(_)), "{}", err);

    let bytes = Fixture::new(&para("x")).without_content_types().build();
    assert!(decode(&bytes).unwrap_err().is_corrupt_package());
}

#[test]
fn test_missing_styles_is_flagged_not_fatal() {
    let bytes = Fixture::new(&para("Still readable")).without_styles().build();
    let decoded = decode(&bytes).unwrap();

    assert!(decoded
        .model
        .metadata
        .corruption
        .contains(&CorruptionFlag::MissingStyles));
    assert_eq!(decoded.model.plain_text(), "Still readable");
    assert!(decoded.model.metadata.entries.contains(&"word/document.xml".to_string()));
}

#[test]
fn test_style_free_package_uses_best_remaining_strategy() {
    let bytes = Fixture::new(&format!("{}{}", para("One"), para("Two"))).build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.model.metadata.method.as_deref(), Some("high_fidelity"));
    assert_eq!(
        decoded.model.blocks,
        vec![
            Block::paragraph(vec![Run::text("One")]),
            Block::paragraph(vec![Run::text("Two")]),
        ]
    );
}

#[test]
fn test_structured_only_when_configured() {
    let body = r#"<w:p><w:r><w:rPr><w:color w:val="FF0000"/></w:rPr><w:t>Red</w:t></w:r></w:p>"#;
    let bytes = Fixture::new(body).build();
    let options = DecodeOptions::default().with_strategies(vec![StrategyKind::Structured]);
    let decoded = decode_with_options(&bytes, None, &options).unwrap();

    assert_eq!(decoded.model.metadata.method.as_deref(), Some("structured"));
    assert!(!decoded.html.contains("style="));
    assert_eq!(decoded.model.blocks, vec![Block::paragraph(vec![Run::text("Red")])]);
}

#[test]
fn test_malformed_main_part_is_salvaged() {
    let body = "<w:p><w:r><w:t>Survivor</w:t></w:r></w:p><w:p><w:r><w:t>Broken";
    let bytes = Fixture::new(body).build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.model.metadata.method.as_deref(), Some("legacy"));
    assert!(decoded.model.plain_text().starts_with("Survivor"));
    assert!(decoded
        .model
        .metadata
        .warnings()
        .iter()
        .any(|w| w.contains("structured strategy rejected")));
}

#[test]
fn test_exhaustion_returns_empty_model_with_reasons() {
    let bytes = Fixture::new("<w:sectPr/>").build();
    let decoded = decode(&bytes).unwrap();

    assert!(decoded.model.blocks.is_empty());
    assert!(decoded.html.is_empty());
    let warnings = decoded.model.metadata.warnings();
    assert!(warnings.iter().any(|w| w.contains("structured")));
    assert!(warnings.iter().any(|w| w.contains("high_fidelity")));
    assert!(warnings.iter().any(|w| w.contains("legacy")));
    assert_eq!(warnings.last().map(String::as_str), Some("all decoding strategies exhausted"));
}

#[test]
fn test_large_package_offload_keeps_content() {
    let body: String = (0..50).map(|i| para(&format!("Paragraph {}", i))).collect();
    let bytes = Fixture::new(&body).build();
    let options = DecodeOptions::default()
        .with_large_file_threshold(64)
        .with_image_plausible_size(u64::MAX);
    let decoded = decode_with_options(&bytes, None, &options).unwrap();

    assert_eq!(decoded.model.blocks.len(), 50);
    assert_eq!(decoded.model.metadata.method.as_deref(), Some("structured"));
}

#[test]
fn test_mhtml_images_are_inlined() {
    let archive = "MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"SEP\"; type=\"text/html\"\r\n\
\r\n\
--SEP\r\n\
Content-Type: text/html; charset=\"utf-8\"\r\n\
Content-Location: file:///C:/doc.htm\r\n\
\r\n\
<html><body><p>Saved page</p><img src=\"doc_files/image001.png\"></body></html>\r\n\
--SEP\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Location: file:///C:/doc_files/image001.png\r\n\
\r\n\
iVBORw0KGgo=\r\n\
--SEP--\r\n";
    let decoded = decode(archive.as_bytes()).unwrap();

    assert_eq!(decoded.model.metadata.method.as_deref(), Some("mhtml"));
    assert_eq!(decoded.model.metadata.image_count, 1);
    assert!(decoded.html.contains("data:image/png;base64,iVBORw0KGgo="));
}
