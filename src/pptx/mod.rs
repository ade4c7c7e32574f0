//! PPTX package manipulation

pub mod package;
pub mod rels;
pub mod content_types;
pub mod presentation;
pub mod merge;
pub mod metadata;

// Re-export commonly used items
pub use package::Package;
pub use merge::{append_deck, AppendOutcome};
pub use metadata::count_slides;
