//! Part template fetching, file selection, copying and manifest updates
//!
//! This module provides:
//! - Part template download from remote URLs or local directories
//! - Glob-based file selection over a downloaded part
//! - Copying (with optional variable rendering) into the destination
//! - package.json merging
//! - Version compatibility checking for parts files

pub mod copier;
pub mod fetcher;
pub mod manifest;
pub mod render;
pub mod selector;
pub mod version;

use crate::config::{PartsFile, PARTS_FILE_NAME};
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

pub use copier::copy_files;
pub use fetcher::{DownloadedSource, Downloader, TemplateFetcher, TemplateSource};
pub use manifest::{merge_manifest, MANIFEST_FILE};
pub use selector::select_files;
pub use version::check_compatibility;

/// Build zip files for all parts declared in a local template directory
pub async fn build_zips<C: ProductConfig>(
    config: &C,
    template_dir: &Option<PathBuf>,
) -> Result<()> {
    let dir = template_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("templates"));

    if !dir.exists() {
        anyhow::bail!("Template directory not found: {}", dir.display());
    }

    let parts_path = dir.join(PARTS_FILE_NAME);
    if !parts_path.exists() {
        anyhow::bail!("{} not found in {}", PARTS_FILE_NAME, dir.display());
    }

    let content = std::fs::read_to_string(&parts_path)
        .with_context(|| format!("Failed to read {}", parts_path.display()))?;
    let parts_file = PartsFile::from_yaml(&content)
        .with_context(|| format!("Failed to parse {}", parts_path.display()))?;

    println!(
        "{}",
        format!("Building {} part zips...", config.display_name())
            .cyan()
            .bold()
    );
    println!();

    let mut built = 0;
    for part in parts_file.parts.iter().filter(|part| !part.skip_template) {
        let part_path = dir.join(&part.id);
        if !part_path.exists() {
            eprintln!(
                "{} Part directory not found: {}",
                "Warning:".yellow(),
                part_path.display()
            );
            continue;
        }

        print!("  {} {}...", "->".blue(), part.id);

        match fetcher::build_local_zip(&dir, &part.id) {
            Ok(zip_bytes) => {
                let zip_path = dir.join(format!("{}.zip", part.id));
                std::fs::write(&zip_path, &zip_bytes)
                    .with_context(|| format!("Failed to write {}", zip_path.display()))?;
                println!(" {} ({} bytes)", "done".green(), zip_bytes.len());
                built += 1;
            }
            Err(e) => {
                println!(" {}", "failed".red());
                eprintln!("    Error: {}", e);
            }
        }
    }

    println!();
    println!(
        "{} {} part zip(s) in {}",
        "Built".green().bold(),
        built,
        dir.display()
    );

    Ok(())
}
