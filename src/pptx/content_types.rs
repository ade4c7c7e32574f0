//! `[Content_Types].xml` editing
//!
//! New parts must be declared either through a `Default` entry for their
//! file extension or an `Override` for their exact part name. Existing
//! bytes are preserved; new entries are spliced in before `</Types>`.

use std::collections::HashMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

/// Content type of a slide part.
pub const CT_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Collect the `Default` entries as an extension -> content-type map.
/// Extensions are compared lowercase, as OPC requires.
pub fn defaults(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut map = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if e.local_name().as_ref() != b"Default" {
                    continue;
                }
                let mut extension = None;
                let mut content_type = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Extension" => extension = Some(value.to_ascii_lowercase()),
                        b"ContentType" => content_type = Some(value),
                        _ => {}
                    }
                }
                if let (Some(ext), Some(ct)) = (extension, content_type) {
                    map.insert(ext, ct);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(map)
}

/// Splice new entries in before the closing `</Types>` tag.
///
/// `overrides` pairs are `(part name, content type)`; part names get a
/// leading `/` as OPC override names are package-absolute. `new_defaults`
/// pairs are `(extension, content type)` and should already be filtered
/// against [`defaults`].
pub fn add_entries(
    xml: &[u8],
    new_defaults: &[(String, String)],
    overrides: &[(String, String)],
) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(xml)
        .map_err(|_| Error::General("content types part is not UTF-8".to_string()))?;
    let close = text
        .rfind("</Types>")
        .ok_or_else(|| Error::General("malformed content types part".to_string()))?;

    let mut out = String::with_capacity(text.len() + 128 * (new_defaults.len() + overrides.len()));
    out.push_str(&text[..close]);
    for (ext, ct) in new_defaults {
        out.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape(ext),
            escape(ct)
        ));
    }
    for (part, ct) in overrides {
        out.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            escape(part),
            escape(ct)
        ));
    }
    out.push_str(&text[close..]);
    Ok(out.into_bytes())
}
