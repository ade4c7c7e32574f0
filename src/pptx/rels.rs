//! Relationship (`*.rels`) part handling
//!
//! Every part may have a sibling `_rels/<name>.rels` part listing its
//! outgoing relationships. Targets are relative to the owning part's
//! directory, or package-absolute when they start with `/`.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;

/// Relationship type of a slide referenced by the presentation part.
pub const TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Relationship type of a slide's layout.
pub const TYPE_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

/// Relationship type of an embedded image.
pub const TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"` (hyperlinks and the like)
    pub external: bool,
}

/// Parse a `.rels` part into its relationship entries.
pub fn parse(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if e.local_name().as_ref() != b"Relationship" {
                    continue;
                }
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }
                if !rel.id.is_empty() {
                    rels.push(rel);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Serialize relationship entries back into a `.rels` part.
pub fn serialize(rels: &[Relationship]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            escape(&rel.id),
            escape(&rel.rel_type),
            escape(&rel.target),
        ));
        if rel.external {
            xml.push_str(r#" TargetMode="External""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

/// The `.rels` part name for a given part name.
///
/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against its owning part's directory.
///
/// `resolve_target("ppt/slides/slide1.xml", "../media/image1.png")`
/// -> `ppt/media/image1.png`
pub fn resolve_target(owner_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut components: Vec<&str> = match owner_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}

/// Make a target for `dest_part` relative to `owner_part`'s directory.
///
/// Both slide parts and their media live under `ppt/`, so one level of
/// `..` is always enough for the parts this crate writes.
pub fn relative_target(owner_part: &str, dest_part: &str) -> String {
    let owner_dir = owner_part.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    if let Some(rest) = dest_part.strip_prefix(&format!("{}/", owner_dir)) {
        return rest.to_string();
    }
    match owner_dir.rsplit_once('/') {
        Some((parent, _)) => match dest_part.strip_prefix(&format!("{}/", parent)) {
            Some(rest) => format!("../{}", rest),
            None => format!("/{}", dest_part),
        },
        None => format!("/{}", dest_part),
    }
}
