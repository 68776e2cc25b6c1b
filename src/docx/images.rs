//! Image extraction.
//!
//! Four embedding mechanisms reach the same result: DrawingML inline
//! (`wp:inline`) and anchored (`wp:anchor`) pictures, legacy VML pictures
//! (`w:pict/v:imagedata`) and embedded objects whose VML preview carries
//! the image (`w:object`). Bytes are resolved through the owning part's
//! relationships and inlined as `data:` URIs.

use super::package::{DocxPackage, Part};
use crate::error::{Error, Result};
use crate::model::{
    mime_from_filename, sniff_image_mime, to_data_uri, Alignment, ImageBlock, Margins,
};
use crate::normalize::{parse_css_length, px_from_emu};
use crate::xml::{Tag, XmlElement};

/// Whether an element is one of the image carriers.
pub fn is_image_carrier(element: &XmlElement) -> bool {
    matches!(element.tag, Tag::Drawing | Tag::Pict | Tag::Object)
}

/// Extract the image held by a `w:drawing`, `w:pict` or `w:object`.
///
/// `Ok(None)` means the carrier holds no picture (a shape or chart);
/// errors describe a picture that could not be resolved.
pub fn extract_image(
    pkg: &DocxPackage,
    part: &Part,
    carrier: &XmlElement,
) -> Result<Option<ImageBlock>> {
    match carrier.tag {
        Tag::Drawing => from_drawing(pkg, part, carrier),
        Tag::Pict | Tag::Object => from_vml(pkg, part, carrier),
        _ => Ok(None),
    }
}

fn from_drawing(pkg: &DocxPackage, part: &Part, drawing: &XmlElement) -> Result<Option<ImageBlock>> {
    let frame = match drawing
        .child(Tag::Inline)
        .or_else(|| drawing.child(Tag::Anchor))
    {
        Some(frame) => frame,
        None => return Ok(None),
    };
    let Some(blip) = frame.find(Tag::Blip) else {
        return Ok(None);
    };

    let rel_id = match blip.attr("r:embed") {
        Some(id) if !id.is_empty() => id,
        _ => {
            return match blip.attr("r:link") {
                Some(id) => Err(Error::InvalidData(format!(
                    "image {} is linked, not embedded",
                    id
                ))),
                None => Err(Error::MissingComponent("a:blip without r:embed".to_string())),
            };
        }
    };

    let mut image = embedded(pkg, part, rel_id)?;

    if let Some(extent) = frame.child(Tag::Extent) {
        image.width = emu_attr(extent, "cx");
        image.height = emu_attr(extent, "cy");
    }
    image.alt = frame
        .child(Tag::DocProps)
        .and_then(|props| props.attr("descr").or_else(|| props.attr("title")))
        .filter(|alt| !alt.is_empty())
        .map(str::to_string);
    image.margins = frame_margins(frame);
    if frame.tag == Tag::Anchor {
        image.align = frame
            .child_named("wp:positionH")
            .and_then(|pos| pos.child_named("wp:align"))
            .and_then(|align| Alignment::parse(&align.text_content()));
    }

    Ok(Some(image))
}

fn from_vml(pkg: &DocxPackage, part: &Part, carrier: &XmlElement) -> Result<Option<ImageBlock>> {
    let Some(data) = carrier.find(Tag::ImageData) else {
        return Ok(None);
    };
    let rel_id = data
        .attr("r:id")
        .or_else(|| data.attr("r:pict"))
        .ok_or_else(|| Error::MissingComponent("v:imagedata without r:id".to_string()))?;

    let mut image = embedded(pkg, part, rel_id)?;
    image.alt = data
        .attr("o:title")
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    // Size lives on the enclosing shape's CSS-like style attribute.
    if let Some(style) = carrier.find_named("v:shape").and_then(|s| s.attr("style")) {
        for declaration in style.split(';') {
            let Some((key, value)) = declaration.split_once(':') else {
                continue;
            };
            match key.trim() {
                "width" => image.width = parse_css_length(value),
                "height" => image.height = parse_css_length(value),
                _ => {}
            }
        }
    }
    Ok(Some(image))
}

fn embedded(pkg: &DocxPackage, part: &Part, rel_id: &str) -> Result<ImageBlock> {
    let media = pkg.media_for(part, rel_id)?;
    let mime = mime_from_filename(media.path)
        .or_else(|| sniff_image_mime(media.data))
        .ok_or_else(|| {
            Error::InvalidData(format!("unrecognized image data in {}", media.path))
        })?;
    Ok(ImageBlock::new(to_data_uri(mime, media.data)))
}

fn emu_attr(element: &XmlElement, name: &str) -> Option<f64> {
    element
        .attr(name)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(px_from_emu)
}

fn frame_margins(frame: &XmlElement) -> Option<Margins> {
    let side = |name: &str| {
        frame
            .attr(name)
            .and_then(|v| v.parse::<i64>().ok())
            .map(px_from_emu)
            .unwrap_or(0.0)
    };
    let margins = Margins {
        top: side("distT"),
        right: side("distR"),
        bottom: side("distB"),
        left: side("distL"),
    };
    (margins != Margins::default()).then_some(margins)
}
