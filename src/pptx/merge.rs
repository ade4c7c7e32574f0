//! Deck-to-deck slide appending
//!
//! Slides are moved between packages as whole parts: the slide XML is
//! copied byte-for-byte and only its relationship part is rewritten. That
//! keeps text runs, shapes, and formatting intact without reinterpreting
//! drawing markup. Relationship kinds the copy cannot carry across
//! (notes, charts, audio/video, embedded objects) are dropped and
//! surfaced to the caller so the run can warn instead of abort.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::pptx::content_types::{self, CT_SLIDE};
use crate::pptx::package::{Package, CONTENT_TYPES_PART, PRESENTATION_PART, PRESENTATION_RELS};
use crate::pptx::presentation::{self, SlideRef};
use crate::pptx::rels::{self, Relationship};

/// What one [`append_deck`] call did.
#[derive(Debug, Default)]
pub struct AppendOutcome {
    /// Slides appended to the destination
    pub slides: usize,
    /// Human-readable descriptions of relationships that were dropped
    pub dropped: Vec<String>,
}

/// Append every slide of `src` to `dest`, in `src`'s slide order.
///
/// The destination package is updated in place: slide and media parts,
/// content-type entries, presentation relationships, and the slide list.
/// An error leaves `dest` unusable for saving and should fail the source
/// file as a whole.
pub fn append_deck(dest: &mut Package, src: &Package) -> Result<AppendOutcome> {
    let src_refs = presentation::slide_refs(src.part(PRESENTATION_PART)?)?;
    if src_refs.is_empty() {
        return Ok(AppendOutcome::default());
    }

    let src_pres_rels = rels::parse(src.part(PRESENTATION_RELS)?)?;
    let src_slide_parts: HashMap<&str, String> = src_pres_rels
        .iter()
        .filter(|r| r.rel_type == rels::TYPE_SLIDE)
        .map(|r| {
            (
                r.id.as_str(),
                rels::resolve_target(PRESENTATION_PART, &r.target),
            )
        })
        .collect();

    let mut dest_pres_rels = rels::parse(dest.part(PRESENTATION_RELS)?)?;
    let dest_refs = presentation::slide_refs(dest.part(PRESENTATION_PART)?)?;
    let known_defaults = content_types::defaults(dest.part(CONTENT_TYPES_PART)?)?;
    let fallback_layout = first_layout(dest);

    let mut next_rid = next_rid_number(&dest_pres_rels);
    let mut next_slide = max_numbered(dest, "ppt/slides/slide") + 1;
    let mut next_media = max_numbered(dest, "ppt/media/image") + 1;
    let mut next_slide_id = presentation::max_slide_id(&dest_refs) + 1;

    let mut outcome = AppendOutcome::default();
    let mut new_refs: Vec<SlideRef> = Vec::new();
    let mut new_defaults: Vec<(String, String)> = Vec::new();
    let mut new_overrides: Vec<(String, String)> = Vec::new();
    // media copied once per source package, keyed by source part name
    let mut media_map: HashMap<String, String> = HashMap::new();

    for slide_ref in &src_refs {
        let src_part = src_slide_parts.get(slide_ref.rid.as_str()).ok_or_else(|| {
            Error::MergeItem(
                src.path().to_path_buf(),
                format!("slide relationship {} not found", slide_ref.rid),
            )
        })?;
        let slide_xml = src.part(src_part)?.to_vec();

        let dest_part = format!("ppt/slides/slide{}.xml", next_slide);
        next_slide += 1;

        // rewrite the slide's relationships for the destination package
        let src_slide_rels = match src.part_opt(&rels::rels_name(src_part)) {
            Some(xml) => rels::parse(xml)?,
            None => Vec::new(),
        };
        let mut kept: Vec<Relationship> = Vec::new();
        for rel in src_slide_rels {
            if rel.external {
                kept.push(rel);
                continue;
            }
            let source_target = rels::resolve_target(src_part, &rel.target);
            let new_target = match rel.rel_type.as_str() {
                rels::TYPE_SLIDE_LAYOUT => {
                    // same-named layout when the destination has one,
                    // otherwise its first layout
                    let layout = if dest.contains(&source_target) {
                        Some(source_target)
                    } else {
                        fallback_layout.clone()
                    };
                    match layout {
                        Some(layout) => Some(rels::relative_target(&dest_part, &layout)),
                        None => {
                            outcome
                                .dropped
                                .push(format!("slide layout {}", rel.target));
                            None
                        }
                    }
                }
                rels::TYPE_IMAGE => {
                    let dest_media = match media_map.get(&source_target).cloned() {
                        Some(existing) => existing,
                        None => {
                            let blob = src.part(&source_target)?.to_vec();
                            let extension = part_extension(&source_target).to_string();
                            let media_part =
                                format!("ppt/media/image{}.{}", next_media, extension);
                            next_media += 1;
                            dest.insert(media_part.clone(), blob);
                            let lower = extension.to_ascii_lowercase();
                            if !known_defaults.contains_key(&lower)
                                && !new_defaults.iter().any(|(e, _)| *e == lower)
                            {
                                new_defaults.push((lower.clone(), media_content_type(&lower)));
                            }
                            media_map.insert(source_target, media_part.clone());
                            media_part
                        }
                    };
                    Some(rels::relative_target(&dest_part, &dest_media))
                }
                other => {
                    let kind = other.rsplit('/').next().unwrap_or(other);
                    outcome.dropped.push(format!("{} {}", kind, rel.target));
                    None
                }
            };
            if let Some(target) = new_target {
                kept.push(Relationship { target, ..rel });
            }
        }

        dest.insert(dest_part.clone(), slide_xml);
        dest.insert(rels::rels_name(&dest_part), rels::serialize(&kept));
        new_overrides.push((dest_part.clone(), CT_SLIDE.to_string()));

        let rid = format!("rId{}", next_rid);
        next_rid += 1;
        dest_pres_rels.push(Relationship {
            id: rid.clone(),
            rel_type: rels::TYPE_SLIDE.to_string(),
            target: rels::relative_target(PRESENTATION_PART, &dest_part),
            external: false,
        });
        new_refs.push(SlideRef {
            id: next_slide_id,
            rid,
        });
        next_slide_id += 1;
        outcome.slides += 1;
    }

    let updated_pres =
        presentation::append_slide_refs(dest.part(PRESENTATION_PART)?, &new_refs)?;
    dest.insert(PRESENTATION_PART, updated_pres);
    dest.insert(PRESENTATION_RELS, rels::serialize(&dest_pres_rels));
    let updated_types = content_types::add_entries(
        dest.part(CONTENT_TYPES_PART)?,
        &new_defaults,
        &new_overrides,
    )?;
    dest.insert(CONTENT_TYPES_PART, updated_types);

    Ok(outcome)
}

/// Highest `<prefix>N.<ext>` number among the package's parts.
fn max_numbered(pkg: &Package, prefix: &str) -> u32 {
    pkg.part_names()
        .filter_map(|name| {
            let rest = name.strip_prefix(prefix)?;
            let digits = rest.split('.').next()?;
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
}

/// Lowest-numbered slide layout part, if the package has any.
fn first_layout(pkg: &Package) -> Option<String> {
    pkg.part_names()
        .filter(|name| {
            name.starts_with("ppt/slideLayouts/slideLayout") && name.ends_with(".xml")
        })
        .min_by_key(|name| {
            name.strip_prefix("ppt/slideLayouts/slideLayout")
                .and_then(|rest| rest.strip_suffix(".xml"))
                .and_then(|digits| digits.parse::<u32>().ok())
                .unwrap_or(u32::MAX)
        })
        .map(str::to_string)
}

/// First free `rId<N>` number in a relationship list.
fn next_rid_number(rels: &[Relationship]) -> u32 {
    rels.iter()
        .filter_map(|r| r.id.strip_prefix("rId"))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

fn part_extension(part: &str) -> &str {
    part.rsplit('.').next().unwrap_or("bin")
}

fn media_content_type(extension: &str) -> String {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}
