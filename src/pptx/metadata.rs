//! Presentation metadata

use std::path::Path;

use crate::error::Result;
use crate::pptx::package::{Package, PRESENTATION_PART};
use crate::pptx::presentation;

/// Number of slides in an already-opened package.
pub fn slide_count(pkg: &Package) -> Result<usize> {
    Ok(presentation::slide_refs(pkg.part(PRESENTATION_PART)?)?.len())
}

/// Count the slides in a .pptx file.
pub fn count_slides(path: &Path) -> Result<usize> {
    let pkg = Package::open(path)?;
    slide_count(&pkg)
}
