//! Input file collection and ordering

use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions};

use crate::error::{Error, Result};

/// List the files in `dir` whose extension matches `extension`
/// (case-insensitive), sorted ascending by file name.
///
/// The returned order is the merge order. An empty result is not an
/// error; the caller decides whether that is fatal.
///
/// # Example
///
/// ```no_run
/// use deck_merge::collect::collect;
/// use std::path::Path;
///
/// let decks = collect(Path::new("slideshows/week-03"), "pptx").unwrap();
/// for deck in &decks {
///     println!("{}", deck.display());
/// }
/// ```
pub fn collect(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FolderNotFound(dir.to_path_buf()));
    }

    let pattern = dir.join(format!("*.{}", extension));
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::InvalidGlob(pattern.to_string_lossy().into_owned()))?
        .to_string();

    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in glob_with(&pattern, options).map_err(|e| Error::InvalidGlob(e.to_string()))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => eprintln!("Warning: could not read {}: {}", pattern, e),
        }
    }

    // Ordinal byte-wise comparison keeps the merge order deterministic
    // regardless of locale.
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}
