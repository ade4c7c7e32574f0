//! Per-file outcome reporting
//!
//! Every input file gets one line naming the file and its outcome, and a
//! run ends with one summary line. All diagnostics are plain text on
//! stderr; partial success is still success.

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Collects per-file outcome counts while echoing one line per attempt.
#[derive(Debug, Default)]
pub struct Reporter {
    merged: usize,
    skipped: usize,
    failed: usize,
    warnings: usize,
}

/// Final counts of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Path of the written output document
    pub output: PathBuf,
    /// Files whose content made it into the output
    pub merged: usize,
    /// Files skipped for non-error reasons
    pub skipped: usize,
    /// Files dropped because a per-file step errored
    pub failed: usize,
    /// Non-fatal warnings emitted along the way
    pub warnings: usize,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One input was exported to an intermediate document.
    pub fn converted(&mut self, name: &str) {
        eprintln!("{}: converted", name);
    }

    /// One input's content was appended to the output. `units` is the
    /// slide or page count, `unit` its singular label.
    pub fn merged(&mut self, name: &str, units: usize, unit: &str) {
        self.merged += 1;
        eprintln!("{}: merged ({} {}(s))", name, units, unit);
    }

    pub fn skipped(&mut self, name: &str, reason: &str) {
        self.skipped += 1;
        eprintln!("{}: skipped: {}", name, reason);
    }

    pub fn failed(&mut self, name: &str, reason: impl Display) {
        self.failed += 1;
        eprintln!("{}: failed: {}", name, reason);
    }

    pub fn warn(&mut self, message: impl Display) {
        self.warnings += 1;
        eprintln!("Warning: {}", message);
    }

    pub fn merged_count(&self) -> usize {
        self.merged
    }

    /// Emit the summary line and convert the counters into a `RunSummary`.
    pub fn finish(self, output: &Path) -> RunSummary {
        eprintln!(
            "{} merged, {} skipped, {} failed -> {}",
            self.merged,
            self.skipped,
            self.failed,
            output.display()
        );
        RunSummary {
            output: output.to_path_buf(),
            merged: self.merged,
            skipped: self.skipped,
            failed: self.failed,
            warnings: self.warnings,
        }
    }
}
