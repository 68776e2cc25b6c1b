//! Footnote and endnote parts.

use super::convert::block_children;
use crate::model::{Block, RunContent};
use crate::xml::{Tag, XmlElement};

/// A note body from a notes part.
pub(crate) struct NoteBody<'x> {
    pub id: u32,
    pub elements: Vec<&'x XmlElement>,
}

/// Real notes of a `w:footnotes` / `w:endnotes` root in document order.
/// Separator notes and notes with non-positive ids are skipped.
pub(crate) fn note_bodies(root: &XmlElement) -> Vec<NoteBody<'_>> {
    root.elements()
        .filter(|e| e.tag == Tag::Note)
        .filter(|e| {
            !matches!(
                e.attr("w:type"),
                Some("separator" | "continuationSeparator" | "continuationNotice")
            )
        })
        .filter_map(|note| {
            let id = note.attr("w:id")?.trim().parse::<u32>().ok()?;
            (id > 0).then(|| NoteBody {
                id,
                elements: block_children(note),
            })
        })
        .collect()
}

/// Drop the space that follows the reference mark at the start of a note.
pub(crate) fn trim_leading_space(blocks: &mut [Block]) {
    let Some(Block::Paragraph { runs, .. }) = blocks.first_mut() else {
        return;
    };
    if let Some(run) = runs.first_mut() {
        if let RunContent::Text { text } = &mut run.content {
            let trimmed = text.trim_start().to_string();
            *text = trimmed;
        }
    }
    runs.retain(|r| r.as_text() != Some(""));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Run;
    use crate::xml;

    #[test]
    fn test_note_bodies_skip_separators() {
        let root = xml::parse(
            r#"<w:footnotes><w:footnote w:type="separator" w:id="-1"><w:p/></w:footnote><w:footnote w:type="continuationSeparator" w:id="0"><w:p/></w:footnote><w:footnote w:id="1"><w:p><w:r><w:t>One</w:t></w:r></w:p></w:footnote><w:footnote w:id="2"><w:sdt><w:sdtContent><w:p/></w:sdtContent></w:sdt></w:footnote></w:footnotes>"#,
        )
        .unwrap();
        let notes = note_bodies(&root);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, 1);
        assert_eq!(notes[1].elements.len(), 1);
        assert_eq!(notes[1].elements[0].tag, Tag::Paragraph);
    }

    #[test]
    fn test_trim_leading_space() {
        let mut blocks = vec![Block::paragraph(vec![Run::text(" "), Run::text(" body")])];
        trim_leading_space(&mut blocks);
        assert_eq!(blocks, vec![Block::paragraph(vec![Run::text(" body")])]);
    }
}
