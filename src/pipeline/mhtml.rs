//! MIME HTML archives.

use crate::error::{Error, Result};
use crate::model::to_data_uri;
use mail_parser::{MessageParser, MimeHeaders};

/// The `text/html` part of a multipart/related archive, with every image
/// part referenced by its `Content-Location` inlined as a data URI.
pub fn unpack(data: &[u8]) -> Result<String> {
    let message = MessageParser::default()
        .parse(data)
        .ok_or_else(|| Error::InvalidData("unparseable MIME archive".to_string()))?;
    let mut html = message
        .parts
        .iter()
        .find(|part| {
            part.content_type().is_some_and(|ct| {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct.subtype().is_some_and(|s| s.eq_ignore_ascii_case("html"))
            })
        })
        .map(|part| String::from_utf8_lossy(part.contents()).into_owned())
        .ok_or_else(|| Error::MissingComponent("text/html part".to_string()))?;

    let mut inlined = 0;
    for part in &message.parts {
        let Some(content_type) = part.content_type() else {
            continue;
        };
        if !content_type.ctype().eq_ignore_ascii_case("image") {
            continue;
        }
        let Some(location) = part.content_location() else {
            continue;
        };
        let mime = format!(
            "image/{}",
            content_type.subtype().unwrap_or("octet-stream").to_ascii_lowercase()
        );
        let uri = to_data_uri(&mime, part.contents());

        // Documents usually reference parts by a relative path, a suffix of
        // the absolute location.
        let mut replaced = replace_reference(&mut html, location, &uri);
        for (i, _) in location.match_indices('/') {
            let suffix = &location[i + 1..];
            if !suffix.is_empty() {
                replaced |= replace_reference(&mut html, suffix, &uri);
            }
        }
        if replaced {
            inlined += 1;
        }
    }
    log::debug!("mhtml: inlined {} image part(s)", inlined);

    Ok(html)
}

/// Replace quoted attribute references to `location`.
fn replace_reference(html: &mut String, location: &str, uri: &str) -> bool {
    let mut replaced = false;
    for quote in ['"', '\''] {
        let needle = format!("{0}{1}{0}", quote, location);
        if html.contains(&needle) {
            *html = html.replace(&needle, &format!("{0}{1}{0}", quote, uri));
            replaced = true;
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = "MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"BOUNDARY\"; type=\"text/html\"\r\n\
\r\n\
--BOUNDARY\r\n\
Content-Type: text/html; charset=\"utf-8\"\r\n\
Content-Location: file:///C:/doc.htm\r\n\
\r\n\
<html><body><p>Archived</p><img src=\"doc_files/image001.png\"></body></html>\r\n\
--BOUNDARY\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Location: file:///C:/doc_files/image001.png\r\n\
\r\n\
iVBORw0KGgo=\r\n\
--BOUNDARY--\r\n";

    #[test]
    fn test_unpack_inlines_images() {
        let html = unpack(ARCHIVE.as_bytes()).unwrap();
        assert!(html.contains("<p>Archived</p>"));
        assert!(html.contains("data:image/png;base64,iVBORw0KGgo="));
        assert!(!html.contains("image001.png"));
    }

    #[test]
    fn test_unpack_without_html_part() {
        let archive = "MIME-Version: 1.0\r\nContent-Type: text/plain\r\n\r\nhello\r\n";
        assert!(unpack(archive.as_bytes()).is_err());
    }
}
