//! Copy selected template files into the destination

use crate::config::TemplateVariables;
use crate::error::{PartError, Result};
use crate::templates::render;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Copy `files` (relative to `source_dir`) to the same relative paths under
/// `target_dir`, creating parent directories and overwriting existing files.
///
/// When `variables` is non-empty, UTF-8 files are rendered; anything else is
/// copied byte for byte. Files copied before a failure are left in place.
pub async fn copy_files(
    source_dir: &Path,
    files: &[String],
    target_dir: &Path,
    variables: &TemplateVariables,
) -> Result<Vec<String>> {
    // Ensure target directory exists
    fs::create_dir_all(target_dir)
        .await
        .map_err(|err| PartError::io(target_dir, err))?;

    let mut copied_files = Vec::with_capacity(files.len());

    for file_path in files {
        let source_path = source_dir.join(file_path);
        let target_path = target_dir.join(file_path);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| PartError::io(parent, err))?;
        }

        if variables.is_empty() {
            fs::copy(&source_path, &target_path)
                .await
                .map_err(|err| PartError::io(&source_path, err))?;
        } else {
            let content = fs::read(&source_path)
                .await
                .map_err(|err| PartError::io(&source_path, err))?;
            let content = match String::from_utf8(content) {
                Ok(text) if render::has_placeholders(&text) => {
                    render::render(&text, variables).into_bytes()
                }
                Ok(text) => text.into_bytes(),
                Err(binary) => binary.into_bytes(),
            };
            fs::write(&target_path, content)
                .await
                .map_err(|err| PartError::io(&target_path, err))?;
        }

        debug!(file = %file_path, "Copied template file");
        copied_files.push(file_path.clone());
    }

    Ok(copied_files)
}
