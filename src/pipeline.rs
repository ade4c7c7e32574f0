//! Run orchestration for the two merge pipelines
//!
//! Both runs share the same shape: collect the folder's decks in name
//! order, push each one through its per-file steps, and treat per-file
//! errors as "skip this file" while the run keeps going. Only an empty
//! folder, a missing converter, or a run where nothing merged at all is
//! fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collect::collect;
use crate::error::{Error, Result};
use crate::pdf::convert::{PdfExporter, SofficeConverter};
use crate::pdf::merge::PdfMerger;
use crate::pptx::merge::append_deck;
use crate::pptx::metadata::slide_count;
use crate::pptx::Package;
use crate::report::{Reporter, RunSummary};

/// Subdirectory of the input folder holding intermediate PDFs. File
/// names inside it are `<input stem>.pdf`, so every intermediate traces
/// back to its source deck.
const TEMP_DIR_NAME: &str = ".pdf-temp";

/// Options for the package-level merge.
#[derive(Debug, Clone)]
pub struct DirectMergeOptions {
    /// Directory containing the input folder (`slideshows` by default)
    pub base_dir: PathBuf,
    /// Folder name under `base_dir`; also names the output file
    pub folder: String,
}

/// Options for the convert-then-merge run.
#[derive(Debug, Clone)]
pub struct PdfMergeOptions {
    pub base_dir: PathBuf,
    pub folder: String,
    /// Keep intermediate PDFs instead of deleting them after the run
    pub keep_temp: bool,
    /// Explicit office binary; discovered on PATH when unset
    pub soffice: Option<PathBuf>,
    /// Per-file conversion deadline
    pub timeout: Duration,
}

/// Merge every deck in `<base>/<folder>/` into `<base>/<folder>.pptx`.
///
/// The first readable deck seeds the output package; the slides of every
/// further deck are appended in file-name order. Unreadable decks are
/// reported and skipped. Fails with [`Error::NoOutput`] when no deck
/// contributed any slides, in which case nothing is written.
pub fn merge_direct(options: &DirectMergeOptions) -> Result<RunSummary> {
    let input_dir = options.base_dir.join(&options.folder);
    let inputs = collect(&input_dir, "pptx")?;
    if inputs.is_empty() {
        return Err(Error::NoInput(input_dir));
    }
    let output = options.base_dir.join(format!("{}.pptx", options.folder));

    let mut reporter = Reporter::new();
    let mut merged: Option<Package> = None;

    for path in &inputs {
        let name = display_name(path);
        if let Some(pkg) = merged.as_mut() {
            match append_one(pkg, path) {
                Ok(outcome) => {
                    for dropped in &outcome.dropped {
                        reporter.warn(format!("{}: {} not copied", name, dropped));
                    }
                    if outcome.slides == 0 {
                        reporter.skipped(&name, "no slides");
                    } else {
                        reporter.merged(&name, outcome.slides, "slide");
                    }
                }
                Err(e) => reporter.failed(&name, e),
            }
        } else {
            match seed_deck(path) {
                Ok((pkg, slides)) => {
                    if slides == 0 {
                        reporter.skipped(&name, "no slides");
                    } else {
                        reporter.merged(&name, slides, "slide");
                    }
                    merged = Some(pkg);
                }
                Err(e) => reporter.failed(&name, e),
            }
        }
    }

    if reporter.merged_count() == 0 {
        return Err(Error::NoOutput);
    }
    // merged is always Some here: a merged count implies a seeded package
    let pkg = merged.ok_or(Error::NoOutput)?;
    pkg.save(&output)?;

    Ok(reporter.finish(&output))
}

fn seed_deck(path: &Path) -> Result<(Package, usize)> {
    let pkg = Package::open(path)?;
    let slides = slide_count(&pkg)?;
    Ok((pkg, slides))
}

/// Append one deck, leaving `dest` untouched when anything fails.
fn append_one(dest: &mut Package, path: &Path) -> Result<crate::pptx::AppendOutcome> {
    let src = Package::open(path)?;
    let mut attempt = dest.clone();
    let outcome = append_deck(&mut attempt, &src)?;
    *dest = attempt;
    Ok(outcome)
}

/// Convert every deck in `<base>/<folder>/` to PDF and merge the results
/// into `<base>/<folder>.pdf`.
///
/// The converter is acquired up front so a missing office installation
/// fails the run before any per-file work. Conversion and append errors
/// are per-file; intermediates are cleaned up after the final write
/// unless `keep_temp` is set, whether or not the run succeeded.
pub fn merge_via_pdf(options: &PdfMergeOptions) -> Result<RunSummary> {
    let input_dir = options.base_dir.join(&options.folder);
    let inputs = collect(&input_dir, "pptx")?;
    if inputs.is_empty() {
        return Err(Error::NoInput(input_dir));
    }

    let converter = SofficeConverter::new(options.soffice.as_deref(), options.timeout)?;
    run_conversion(options, &inputs, &converter)
}

/// Same run with a caller-supplied exporter.
pub fn merge_via_pdf_with(
    options: &PdfMergeOptions,
    exporter: &dyn PdfExporter,
) -> Result<RunSummary> {
    let input_dir = options.base_dir.join(&options.folder);
    let inputs = collect(&input_dir, "pptx")?;
    if inputs.is_empty() {
        return Err(Error::NoInput(input_dir));
    }
    run_conversion(options, &inputs, exporter)
}

fn run_conversion(
    options: &PdfMergeOptions,
    inputs: &[PathBuf],
    exporter: &dyn PdfExporter,
) -> Result<RunSummary> {
    let input_dir = options.base_dir.join(&options.folder);
    let output = options.base_dir.join(format!("{}.pdf", options.folder));
    let temp_dir = input_dir.join(TEMP_DIR_NAME);
    fs::create_dir_all(&temp_dir)?;

    let mut reporter = Reporter::new();
    let mut merger = PdfMerger::new();
    // only files this run produced are cleaned up afterwards
    let mut intermediates: Vec<PathBuf> = Vec::new();

    for path in inputs {
        let name = display_name(path);
        match exporter.export_pdf(path, &temp_dir) {
            Ok(pdf) => {
                intermediates.push(pdf.clone());
                reporter.converted(&name);
                match merger.append(&pdf) {
                    Ok(pages) => reporter.merged(&name, pages, "page"),
                    Err(e) => reporter.failed(&name, e),
                }
            }
            Err(e) => reporter.failed(&name, e),
        }
    }

    let result = if reporter.merged_count() == 0 {
        Err(Error::NoOutput)
    } else {
        merger.save(&output)
    };

    // cleanup happens after the final write step, also on failed runs
    if options.keep_temp {
        eprintln!("intermediate PDFs kept in {}", temp_dir.display());
    } else {
        for file in &intermediates {
            if let Err(e) = fs::remove_file(file) {
                reporter.warn(format!("could not delete {}: {}", file.display(), e));
            }
        }
        // only goes away when nothing else lives in it
        let _ = fs::remove_dir(&temp_dir);
    }

    result?;
    Ok(reporter.finish(&output))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
