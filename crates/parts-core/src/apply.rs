//! Applying a part template to its destination
//!
//! [`PartApplier::apply_part_template`] runs the whole flow for one part:
//! validate the ids, resolve the config, download the template into a
//! scratch directory, copy the selected files, merge package.json and print
//! the suffix note.
//!
//! The scratch directory is a [`tempfile::TempDir`], so it is removed on
//! every exit path. Files copied before a later failure are not rolled back.

use crate::config::{PartConfig, PartRegistry, SrcItem, TemplateVariables};
use crate::error::{PartError, Result};
use crate::templates::{copier, manifest, selector, Downloader};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, info, warn};

const SCRATCH_PREFIX: &str = "parts-download-";

/// Outcome of a successful apply
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub part_id: String,
    pub dest_dir: PathBuf,
    /// Copied files, relative to `dest_dir`
    pub copied_files: Vec<String>,
    /// Written manifest, when the part declares manifest updates
    pub manifest_path: Option<PathBuf>,
    /// Resolved source of the downloaded template; `None` when skipped
    pub source: Option<String>,
}

/// Part ids and src item ids: an ASCII alphanumeric first character, then
/// alphanumerics, `-`, `_` or `.`
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        _ => false,
    }
}

/// Applies part templates from a registry using a download collaborator
pub struct PartApplier<'a, D> {
    registry: &'a PartRegistry,
    downloader: &'a D,
    scratch_root: Option<PathBuf>,
    variable_overrides: TemplateVariables,
}

impl<'a, D: Downloader> PartApplier<'a, D> {
    pub fn new(registry: &'a PartRegistry, downloader: &'a D) -> Self {
        Self {
            registry,
            downloader,
            scratch_root: None,
            variable_overrides: TemplateVariables::new(),
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir
    pub fn scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    /// Variables layered over each part's default variables
    pub fn variables(mut self, overrides: TemplateVariables) -> Self {
        self.variable_overrides = overrides;
        self
    }

    /// Resolve a part and optional src item, validating both ids
    pub fn resolve(
        &self,
        part_id: &str,
        src_item_id: Option<&str>,
    ) -> Result<(&'a PartConfig, Option<&'a SrcItem>)> {
        if !is_valid_id(part_id) {
            return Err(PartError::InvalidPartId(part_id.to_string()));
        }

        let config = self
            .registry
            .get(part_id)
            .ok_or_else(|| PartError::PartNotFound(part_id.to_string()))?;

        let src_item = match src_item_id {
            Some(item_id) => {
                if !is_valid_id(item_id) {
                    return Err(PartError::InvalidSrcItemId(item_id.to_string()));
                }
                let item = config
                    .src_item(item_id)
                    .ok_or_else(|| PartError::SrcItemNotFound {
                        part: part_id.to_string(),
                        item: item_id.to_string(),
                    })?;
                Some(item)
            }
            None => None,
        };

        Ok((config, src_item))
    }

    /// Apply `part_id` (optionally restricted to `src_item_id`), writing the
    /// suffix note to `out`
    pub async fn apply_part_template<W: Write>(
        &self,
        part_id: &str,
        src_item_id: Option<&str>,
        out: &mut W,
    ) -> Result<ApplyReport> {
        let (config, src_item) = self.resolve(part_id, src_item_id)?;
        info!(part = %config.id, src_item = ?src_item_id, "Applying part template");

        let mut report = ApplyReport {
            part_id: config.id.clone(),
            dest_dir: config.dest_dir.clone(),
            ..Default::default()
        };

        if config.skip_template {
            debug!(part = %config.id, "Skipping template download and copy");
        } else {
            let (source, copied_files) = self.download_and_copy(config, src_item).await?;
            report.source = Some(source);
            report.copied_files = copied_files;
        }

        if let Some(updates) = &config.manifest_updates {
            let path = manifest::merge_manifest(&config.dest_dir, updates).await?;
            info!(path = %path.display(), "Updated manifest");
            report.manifest_path = Some(path);
        }

        if let Some(note) = &config.suffix_note {
            writeln!(out, "{}", format!("Note: {}", note).yellow()).map_err(PartError::Output)?;
        }

        Ok(report)
    }

    async fn download_and_copy(
        &self,
        config: &PartConfig,
        src_item: Option<&SrcItem>,
    ) -> Result<(String, Vec<String>)> {
        let scratch = self.create_scratch_dir()?;
        debug!(path = %scratch.path().display(), "Created scratch directory");

        let downloaded = self
            .downloader
            .download(&config.src, scratch.path())
            .await
            .map_err(|source| PartError::Download {
                locator: config.src.to_string(),
                source,
            })?;

        let files = selector::select_files(&downloaded.dir, src_item)?;
        let variables = self.variables_for(config);
        let copied = copier::copy_files(&downloaded.dir, &files, &config.dest_dir, &variables).await?;
        info!(count = copied.len(), dest = %config.dest_dir.display(), "Copied part files");

        let scratch_path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %err, "Failed to remove scratch directory");
        }

        Ok((downloaded.source, copied))
    }

    fn create_scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);

        match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|err| PartError::io(root, err))?;
                builder.tempdir_in(root).map_err(|err| PartError::io(root, err))
            }
            None => builder
                .tempdir()
                .map_err(|err| PartError::io(std::env::temp_dir(), err)),
        }
    }

    fn variables_for(&self, config: &PartConfig) -> TemplateVariables {
        let mut variables = config.default_variables.clone();
        for (key, value) in &self.variable_overrides {
            variables.insert(key.clone(), value.clone());
        }
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("partId1"));
        assert!(is_valid_id("src-item1"));
        assert!(is_valid_id("eslint_v9.config"));
    }

    #[test]
    fn test_invalid_ids() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("test foo"));
        assert!(!is_valid_id("foo\tbar"));
        assert!(!is_valid_id(" leading"));
        assert!(!is_valid_id("-flag"));
        assert!(!is_valid_id("../escape"));
        assert!(!is_valid_id("a/b"));
    }
}
