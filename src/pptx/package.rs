//! In-memory OPC package
//!
//! A .pptx file is an OPC package: a zip archive of XML parts plus binary
//! media. The merge logic only needs "open, read parts, add parts, save",
//! so the package is modeled as a map from part name to bytes. A
//! `BTreeMap` keeps part order stable between runs, which makes repeated
//! merges of the same folder write their entries in the same order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Part name of the main presentation part.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Relationship part of the main presentation part.
pub const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Content types part name.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// A presentation package loaded fully into memory.
#[derive(Clone, Debug)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    path: PathBuf,
}

impl Package {
    /// Open a .pptx package from a file path.
    ///
    /// Fails with [`Error::NotPresentation`] when the archive opens but
    /// does not contain a main presentation part.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut blob = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut blob)?;
            parts.insert(name, blob);
        }

        if !parts.contains_key(PRESENTATION_PART) {
            return Err(Error::NotPresentation(path.to_path_buf()));
        }

        Ok(Self {
            parts,
            path: path.to_path_buf(),
        })
    }

    /// Path this package was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow a part's bytes, or fail with [`Error::MissingPart`].
    pub fn part(&self, name: &str) -> Result<&[u8]> {
        self.parts
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// Borrow a part's bytes if present.
    pub fn part_opt(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Insert or replace a part.
    pub fn insert(&mut self, name: impl Into<String>, blob: Vec<u8>) {
        self.parts.insert(name.into(), blob);
    }

    /// Iterate part names in stable (lexical) order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Write the package to `path`, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, blob) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(blob)?;
        }
        writer.finish()?;
        Ok(())
    }
}
