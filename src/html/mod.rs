//! Canonical HTML mapping.
//!
//! [`to_html`] renders a model in the one HTML shape per block that
//! [`from_html`] reads back; decode strategies produce that shape and the
//! editor surface consumes it.

mod parse;
mod serialize;

pub use parse::from_html;
pub use serialize::{blocks_to_html, paragraph_css, run_css, runs_to_html, to_html, LETTERHEAD_ATTR};

/// Whether HTML carries inline styling. Strategy results without it are
/// treated as lower fidelity.
pub fn has_style_signal(html: &str) -> bool {
    html.contains(" style=\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Alignment, Block, DocumentModel, ImageBlock, LineHeight, ListItem, ListKind, Margins,
        ParagraphStyle, Run, RunStyle, Table, TableCell, TableRow,
    };

    fn sample_model() -> DocumentModel {
        let mut model = DocumentModel::with_blocks(vec![
            Block::Heading {
                level: 2,
                runs: vec![Run::text("Title")],
                style: ParagraphStyle {
                    alignment: Some(Alignment::Center),
                    ..Default::default()
                },
            },
            Block::Paragraph {
                runs: vec![
                    Run::text("Plain & "),
                    Run::styled(
                        "styled",
                        RunStyle {
                            bold: true,
                            underline: true,
                            font_size: Some(16.0),
                            color: Some("#C00000".to_string()),
                            ..Default::default()
                        },
                    ),
                    Run::line_break(),
                    Run::styled(
                        "link",
                        RunStyle {
                            link: Some("https://example.com".to_string()),
                            ..Default::default()
                        },
                    ),
                    Run::endnote_ref(1),
                ],
                style: ParagraphStyle {
                    indent_left: Some(32.0),
                    first_line_indent: Some(-16.0),
                    line_height: Some(LineHeight::Px(20.5)),
                    space_before: Some(4.0),
                    ..Default::default()
                },
            },
            Block::List {
                kind: ListKind::Bullet,
                start: None,
                items: vec![ListItem::new(vec![
                    Block::paragraph(vec![Run::text("outer")]),
                    Block::List {
                        kind: ListKind::Ordered,
                        start: Some(2),
                        items: vec![ListItem::new(vec![Block::paragraph(vec![Run::text(
                            "inner",
                        )])])],
                    },
                ])],
            },
            Block::Blockquote {
                blocks: vec![Block::paragraph(vec![Run::text("quoted")])],
            },
            Block::Code {
                text: "let x = 1;\nlet y = x < 2;".to_string(),
                language: None,
            },
            Block::Table(Table {
                rows: vec![
                    TableRow::new(vec![
                        TableCell::new(vec![Block::paragraph(vec![Run::text("a")])])
                            .with_span(1, 2),
                        TableCell::new(vec![Block::paragraph(vec![Run::text("b")])]),
                    ]),
                    TableRow::new(vec![TableCell::new(vec![]).with_background("#D9D9D9")]),
                ],
                column_widths: vec![100.0, 200.0],
            }),
            Block::Image(ImageBlock {
                src: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                original_src: Some("media/image1.png".to_string()),
                alt: Some("Chart".to_string()),
                width: Some(120.0),
                height: Some(80.0),
                align: Some(Alignment::Right),
                margins: Some(Margins {
                    top: 1.0,
                    right: 2.0,
                    bottom: 3.0,
                    left: 4.0,
                }),
            }),
            Block::PageBreak,
            Block::RawHtml {
                html: r#"<div data-letterhead="government"><p>Office</p></div>"#.to_string(),
            },
        ]);
        model.footer = Some(vec![Block::paragraph(vec![Run::text("page")])]);
        model
            .endnotes
            .insert(1, vec![Block::paragraph(vec![Run::text("end")])]);
        model
    }

    #[test]
    fn test_model_survives_html_roundtrip() {
        let model = sample_model();
        let html = to_html(&model);
        let back = from_html(&html).unwrap();
        assert_eq!(back, model);
        assert_eq!(to_html(&back), html);
    }

    #[test]
    fn test_run_boundaries_and_bare_families_survive() {
        let style = RunStyle {
            font_family: Some("SimSun".to_string()),
            ..Default::default()
        };
        let model = DocumentModel::with_blocks(vec![Block::paragraph(vec![
            Run::styled(" ", style.clone()),
            Run::styled("a  b", style),
        ])]);
        let back = from_html(&to_html(&model)).unwrap();
        assert_eq!(back.blocks, model.blocks);
    }

    #[test]
    fn test_style_signal() {
        assert!(has_style_signal(r#"<p style="text-align: center">x</p>"#));
        assert!(!has_style_signal("<p>x</p>"));
        let styled = to_html(&sample_model());
        assert!(has_style_signal(&styled));
    }
}
