//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::{Error, Result};

/// Accumulates the pages of several PDF files into one document.
///
/// The first appended file seeds the accumulator and every further file
/// adds its pages at the end, so append order is page order. Nothing is
/// written until [`PdfMerger::save`].
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use deck_merge::pdf::PdfMerger;
/// use std::path::Path;
///
/// let mut merger = PdfMerger::new();
/// merger.append(Path::new("1. first.pdf")).expect("Failed to read");
/// merger.append(Path::new("2. second.pdf")).expect("Failed to read");
/// merger.save(Path::new("merged.pdf")).expect("Failed to merge");
/// ```
#[derive(Debug)]
pub struct PdfMerger {
    objects: BTreeMap<ObjectId, Object>,
    page_ids: Vec<ObjectId>,
    max_id: u32,
    docs: usize,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_ids: Vec::new(),
            // object numbering starts at 1
            max_id: 1,
            docs: 0,
        }
    }

    /// Load `path` and queue its pages after everything appended so far.
    ///
    /// Returns the number of pages taken from this file. The file's
    /// objects are renumbered past the current maximum so ids never
    /// collide across inputs.
    pub fn append(&mut self, path: &Path) -> Result<usize> {
        let mut doc = Document::load(path)?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }

        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        let count = pages.len();
        self.page_ids.extend(pages.into_iter().map(|(_, id)| id));
        self.objects.extend(doc.objects);
        self.docs += 1;

        Ok(count)
    }

    /// Number of files appended so far.
    pub fn doc_count(&self) -> usize {
        self.docs
    }

    /// Number of pages queued so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Build the merged document and write it to `output_path`.
    ///
    /// Fails with [`Error::NoOutput`] when nothing was appended.
    pub fn save(self, output_path: &Path) -> Result<()> {
        if self.page_ids.is_empty() {
            return Err(Error::NoOutput);
        }

        // Create new document with merged content
        let mut merged_doc = Document::with_version("1.5");

        // Add all collected objects FIRST
        merged_doc.objects.extend(self.objects);

        // CRITICAL: Update max_id to reflect the highest object ID we just added
        // Otherwise new_object_id() will return IDs that collide with existing objects
        merged_doc.max_id = self.max_id - 1;

        // Now create catalog and pages with IDs that won't conflict
        // (they'll be higher than any object from the source PDFs)
        let pages_id = merged_doc.new_object_id();

        // Create Kids array with all page references
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        // Create Pages object
        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        // Create Catalog
        let catalog_id = merged_doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        // Insert catalog and pages into merged document
        merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));

        // Set the catalog as the root
        merged_doc.trailer.set("Root", Object::Reference(catalog_id));

        // Update parent references for all pages
        for &page_id in &self.page_ids {
            if let Ok(page_object) = merged_doc.get_object_mut(page_id) {
                if let Object::Dictionary(ref mut dict) = page_object {
                    dict.set("Parent", Object::Reference(pages_id));
                }
            }
        }

        // Compress and save
        merged_doc.compress();
        merged_doc.save(output_path)?;

        Ok(())
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}
