//! Charm-style CLI prompts using cliclack

use crate::apply::PartApplier;
use crate::config::{PartConfig, PartRegistry};
use crate::product::ProductConfig;
use crate::templates::Downloader;
use anyhow::Result;
use std::path::Path;

/// CLI arguments for the interactive apply flow
#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    /// Part id to apply; prompted for when absent
    pub part: Option<String>,

    /// Src item id; prompted for when absent and the part declares any
    pub src_item: Option<String>,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the apply flow with interactive prompts
pub async fn run<C: ProductConfig, D: Downloader>(
    config: &C,
    registry: &PartRegistry,
    applier: &PartApplier<'_, D>,
    args: ApplyArgs,
) -> Result<()> {
    cliclack::intro(config.display_name())?;

    // Step 1: Select part
    let part = select_part(registry, args.part.as_deref())?;

    // Step 2: Select src item
    let src_item = select_src_item(part, args.src_item, args.yes)?;

    // Step 3: Confirm writing into a non-empty destination
    confirm_destination(&part.dest_dir, args.yes)?;

    // Step 4: Apply
    let spinner = cliclack::spinner();
    spinner.start(format!("Applying {}...", part.id));

    let mut notes = Vec::new();
    let report = match applier
        .apply_part_template(&part.id, src_item.as_deref(), &mut notes)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            spinner.stop("Failed to apply part");
            return Err(e.into());
        }
    };

    spinner.stop(format!(
        "Copied {} files into {}",
        report.copied_files.len(),
        report.dest_dir.display()
    ));

    if let Some(path) = &report.manifest_path {
        cliclack::log::success(format!("Updated {}", path.display()))?;
    }

    let notes = String::from_utf8_lossy(&notes);
    if !notes.trim().is_empty() {
        cliclack::log::remark(notes.trim_end())?;
    }

    cliclack::outro("Part applied!")?;

    Ok(())
}

fn select_part<'r>(registry: &'r PartRegistry, specified: Option<&str>) -> Result<&'r PartConfig> {
    // If a part was given on the command line, use it directly
    if let Some(part_id) = specified {
        return registry.get(part_id).ok_or_else(|| {
            let available: Vec<&str> = registry.ids().collect();
            anyhow::anyhow!(
                "Part config '{}' does not exist. Available parts: {}",
                part_id,
                available.join(", ")
            )
        });
    }

    if registry.is_empty() {
        anyhow::bail!("No parts found.");
    }

    // If only one part, use it automatically
    if registry.len() == 1 {
        if let Some(part) = registry.iter().next() {
            cliclack::log::info(format!("Using part: {}", part.id))?;
            return Ok(part);
        }
    }

    let mut select = cliclack::select("Select a part");
    for (idx, part) in registry.iter().enumerate() {
        select = select.item(idx, &part.id, part.description.as_deref().unwrap_or(""));
    }

    let selected_idx: usize = select.interact()?;

    registry
        .iter()
        .nth(selected_idx)
        .ok_or_else(|| anyhow::anyhow!("Invalid part selection"))
}

fn select_src_item(part: &PartConfig, specified: Option<String>, yes: bool) -> Result<Option<String>> {
    if specified.is_some() || part.skip_template || part.src_items.is_empty() || yes {
        return Ok(specified);
    }

    let mut select = cliclack::select("Select files to copy")
        .item(None, "All files", "");
    for item in &part.src_items {
        let hint = item
            .include
            .as_ref()
            .map(|patterns| patterns.iter().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        select = select.item(Some(item.id.clone()), &item.id, hint);
    }

    Ok(select.interact()?)
}

fn confirm_destination(dest_dir: &Path, yes: bool) -> Result<()> {
    if !dest_dir.is_dir() {
        return Ok(());
    }

    let count = std::fs::read_dir(dest_dir).map(|entries| entries.count()).unwrap_or(0);
    if count == 0 {
        return Ok(());
    }

    cliclack::log::warning(format!(
        "{} has {} existing items; matching files will be overwritten",
        dest_dir.display(),
        count
    ))?;

    // Auto-confirm with --yes flag
    let confirm = if yes {
        true
    } else {
        cliclack::confirm("Continue anyway?")
            .initial_value(true)
            .interact()?
    };

    if !confirm {
        anyhow::bail!("Apply cancelled.");
    }

    Ok(())
}
