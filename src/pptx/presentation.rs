//! `ppt/presentation.xml` slide-list access
//!
//! The document order of `<p:sldId>` entries inside `<p:sldIdLst>` is the
//! slide order of the deck. Appending a slide means adding one entry with
//! a fresh numeric id (256 upwards) and the r:id of a new presentation
//! relationship.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

/// One `<p:sldId>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRef {
    /// Numeric slide id (unique within the deck, >= 256)
    pub id: u32,
    /// Relationship id pointing at the slide part
    pub rid: String,
}

/// Read the slide list in document order.
pub fn slide_refs(xml: &[u8]) -> Result<Vec<SlideRef>> {
    let mut reader = Reader::from_reader(xml);
    let mut refs = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.local_name().as_ref() == b"sldIdLst" => in_list = true,
            Event::End(ref e) if e.local_name().as_ref() == b"sldIdLst" => in_list = false,
            Event::Start(ref e) | Event::Empty(ref e) => {
                if !in_list || e.local_name().as_ref() != b"sldId" {
                    continue;
                }
                let mut id = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    // both attributes have local name "id"; the slide id is
                    // unprefixed, the relationship id carries the r: prefix
                    if attr.key.as_ref() == b"id" {
                        id = value.parse::<u32>().ok();
                    } else if attr.key.as_ref().ends_with(b":id") {
                        rid = Some(value);
                    }
                }
                if let (Some(id), Some(rid)) = (id, rid) {
                    refs.push(SlideRef { id, rid });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(refs)
}

/// Highest slide id currently in use, never below 255 so that fresh ids
/// start at 256 as PowerPoint's own output does.
pub fn max_slide_id(refs: &[SlideRef]) -> u32 {
    refs.iter().map(|r| r.id).fold(255, u32::max)
}

/// Append entries to the slide list, preserving every other byte.
///
/// Handles both an open `<p:sldIdLst>…</p:sldIdLst>` element and the
/// self-closing form a slideless deck may carry.
pub fn append_slide_refs(xml: &[u8], new: &[SlideRef]) -> Result<Vec<u8>> {
    if new.is_empty() {
        return Ok(xml.to_vec());
    }

    let qname = slide_list_qname(xml)?;
    let text = std::str::from_utf8(xml)
        .map_err(|_| Error::General("presentation part is not UTF-8".to_string()))?;

    let mut entries = String::new();
    for slide in new {
        entries.push_str(&format!(
            r#"<p:sldId id="{}" r:id="{}"/>"#,
            slide.id, slide.rid
        ));
    }

    let close_tag = format!("</{}>", qname);
    if let Some(pos) = text.rfind(&close_tag) {
        let mut out = String::with_capacity(text.len() + entries.len());
        out.push_str(&text[..pos]);
        out.push_str(&entries);
        out.push_str(&text[pos..]);
        return Ok(out.into_bytes());
    }

    // self-closing form
    for empty in [format!("<{}/>", qname), format!("<{} />", qname)] {
        if let Some(pos) = text.find(&empty) {
            let mut out = String::with_capacity(text.len() + entries.len());
            out.push_str(&text[..pos]);
            out.push_str(&format!("<{}>{}{}", qname, entries, close_tag));
            out.push_str(&text[pos + empty.len()..]);
            return Ok(out.into_bytes());
        }
    }

    Err(Error::General(
        "presentation has no slide list".to_string(),
    ))
}

/// Find the qualified name the slide list uses (normally `p:sldIdLst`).
fn slide_list_qname(xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if e.local_name().as_ref() == b"sldIdLst" {
                    return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Err(Error::General(
        "presentation has no slide list".to_string(),
    ))
}
