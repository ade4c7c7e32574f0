//! Deck Merge CLI tool
//!
//! A command-line tool for concatenating the slide decks in a folder into
//! one presentation or one PDF.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use deck_merge::pdf::count_pages;
use deck_merge::pipeline::{merge_direct, merge_via_pdf, DirectMergeOptions, PdfMergeOptions};
use deck_merge::pptx::count_slides;

/// Deck Merge - concatenate a folder of slide decks into one file
#[derive(Parser)]
#[command(name = "deck-merge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge slideshows/week-03/*.pptx into slideshows/week-03.pptx
    deck-merge merge week-03

    # Convert each deck to PDF and merge into slideshows/week-03.pdf
    deck-merge pdf week-03

    # Keep the intermediate PDFs for inspection
    deck-merge pdf week-03 --keep-temp

    # Merge decks kept outside the default base directory
    deck-merge merge week-03 --base /srv/decks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a folder of .pptx files into a single .pptx
    Merge {
        /// Folder name under the base directory containing the decks
        folder: String,

        /// Base directory the folder and output live in
        #[arg(long, default_value = "slideshows")]
        base: PathBuf,
    },

    /// Convert each .pptx to PDF and merge the PDFs into one file
    Pdf {
        /// Folder name under the base directory containing the decks
        folder: String,

        /// Base directory the folder and output live in
        #[arg(long, default_value = "slideshows")]
        base: PathBuf,

        /// Keep intermediate PDF files after merging (default: delete them)
        #[arg(long)]
        keep_temp: bool,

        /// Path of the soffice binary (default: search PATH)
        #[arg(long)]
        soffice: Option<PathBuf>,

        /// Per-file conversion timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Show slide or page counts for a .pptx or .pdf file
    Info {
        /// File to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge { folder, base } => cmd_merge(folder, base),
        Commands::Pdf {
            folder,
            base,
            keep_temp,
            soffice,
            timeout,
        } => cmd_pdf(folder, base, keep_temp, soffice, timeout),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Merge the folder's decks at the package level
fn cmd_merge(folder: String, base: PathBuf) -> anyhow::Result<()> {
    let options = DirectMergeOptions {
        base_dir: base,
        folder,
    };

    let summary = merge_direct(&options)
        .with_context(|| format!("could not merge folder '{}'", options.folder))?;

    eprintln!("Merged to: {}", summary.output.display());
    Ok(())
}

/// Convert the folder's decks to PDF and merge the PDFs
fn cmd_pdf(
    folder: String,
    base: PathBuf,
    keep_temp: bool,
    soffice: Option<PathBuf>,
    timeout: u64,
) -> anyhow::Result<()> {
    let options = PdfMergeOptions {
        base_dir: base,
        folder,
        keep_temp,
        soffice,
        timeout: Duration::from_secs(timeout),
    };

    let summary = merge_via_pdf(&options)
        .with_context(|| format!("could not merge folder '{}'", options.folder))?;

    eprintln!("Merged to: {}", summary.output.display());
    Ok(())
}

/// Show counts for a single file
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pptx" => {
            let slides = count_slides(&input)
                .with_context(|| format!("could not read {}", input.display()))?;
            println!("File: {}", input.display());
            println!("Slides: {}", slides);
        }
        "pdf" => {
            let pages = count_pages(&input)
                .with_context(|| format!("could not read {}", input.display()))?;
            println!("File: {}", input.display());
            println!("Pages: {}", pages);
        }
        other => anyhow::bail!("unsupported file type: {:?}", other),
    }

    Ok(())
}
