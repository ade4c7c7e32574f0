//! Error types for the deck-merge library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the deck-merge library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Input folder missing or not a directory
    #[error("folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    /// Folder exists but contains no matching input files
    #[error("no matching input files in {}", .0.display())]
    NoInput(PathBuf),

    /// External converter failed for one input file
    #[error("conversion failed for {}: {1}", .0.display())]
    Conversion(PathBuf, String),

    /// Copying or appending one input file failed
    #[error("could not merge {}: {1}", .0.display())]
    MergeItem(PathBuf, String),

    /// Required external office application is missing
    #[error("converter unavailable: {0}")]
    Unavailable(String),

    /// Every input file failed; nothing was merged
    #[error("no files could be merged")]
    NoOutput,

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Package part referenced but not present
    #[error("missing package part: {0}")]
    MissingPart(String),

    /// File is not a presentation package
    #[error("not a presentation: {}", .0.display())]
    NotPresentation(PathBuf),

    /// Invalid glob pattern
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// General error
    #[error("{0}")]
    General(String),
}
