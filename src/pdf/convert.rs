//! Deck-to-PDF export through a headless office application
//!
//! The office application is a single-instance external resource: it
//! cannot run concurrent sessions against one user profile. The
//! converter therefore owns a dedicated throwaway profile for its whole
//! lifetime and runs one export at a time; dropping the converter
//! releases the profile. The rest of the crate only sees the
//! [`PdfExporter`] trait, a plain `source -> pdf path` function.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::error::{Error, Result};

/// Narrow interface to the external conversion step.
pub trait PdfExporter {
    /// Export `source` as a PDF into `out_dir`, returning the path of
    /// the produced file (`<out_dir>/<source stem>.pdf`).
    fn export_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// PDF export through a LibreOffice (`soffice`) installation.
#[derive(Debug)]
pub struct SofficeConverter {
    program: PathBuf,
    profile: TempDir,
    timeout: Duration,
}

impl SofficeConverter {
    /// Locate the office binary and provision a private user profile.
    ///
    /// `program` overrides discovery; otherwise `soffice`/`libreoffice`
    /// are searched on `PATH`. Fails fast with [`Error::Unavailable`]
    /// when no usable binary exists, before any per-file work starts.
    pub fn new(program: Option<&Path>, timeout: Duration) -> Result<Self> {
        let program = locate(program)?;
        let profile = TempDir::new()?;
        Ok(Self {
            program,
            profile,
            timeout,
        })
    }

    /// The office binary this converter runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn profile_url(&self) -> String {
        let path = self.profile.path().display().to_string().replace('\\', "/");
        if path.starts_with('/') {
            format!("file://{}", path)
        } else {
            format!("file:///{}", path)
        }
    }
}

impl PdfExporter for SofficeConverter {
    fn export_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        let stem = source
            .file_stem()
            .ok_or_else(|| Error::Conversion(source.to_path_buf(), "no file name".to_string()))?;
        let dest = out_dir.join(Path::new(stem).with_extension("pdf"));

        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--norestore")
            .arg(format!("-env:UserInstallation={}", self.profile_url()))
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Unavailable(format!("{} disappeared", self.program.display()))
                } else {
                    Error::Io(e)
                }
            })?;

        // wait with a kill-on-deadline timeout; a hung office process
        // must not stall the whole run
        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Conversion(
                        source.to_path_buf(),
                        format!("timed out after {}s", self.timeout.as_secs()),
                    ));
                }
                None => thread::sleep(Duration::from_millis(100)),
            }
        };

        if !status.success() {
            return Err(Error::Conversion(
                source.to_path_buf(),
                format!("converter exited with {}", status),
            ));
        }
        if !dest.is_file() {
            // soffice reports success on some failures; the output file
            // is the source of truth
            return Err(Error::Conversion(
                source.to_path_buf(),
                "converter produced no PDF".to_string(),
            ));
        }

        Ok(dest)
    }
}

/// Find the office binary: explicit path first, then `PATH`.
fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Unavailable(format!(
            "{} does not exist",
            path.display()
        )));
    }

    let names: &[&str] = if cfg!(windows) {
        &["soffice.exe", "soffice.com"]
    } else {
        &["soffice", "libreoffice"]
    };

    if let Some(path_var) = env::var_os("PATH") {
        for dir in env::split_paths(&path_var) {
            for name in names {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
    }

    Err(Error::Unavailable(
        "no soffice or libreoffice on PATH; install LibreOffice or pass --soffice".to_string(),
    ))
}
