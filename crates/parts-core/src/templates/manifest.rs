//! Package manifest (package.json) updates

use crate::config::ManifestUpdates;
use crate::error::{PartError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Well-known manifest file name in the destination directory
pub const MANIFEST_FILE: &str = "package.json";

pub fn manifest_path(dest_dir: &Path) -> PathBuf {
    dest_dir.join(MANIFEST_FILE)
}

/// Merge `updates` into `dest_dir/package.json`, creating it when missing.
///
/// Returns the path of the written manifest.
pub async fn merge_manifest(dest_dir: &Path, updates: &ManifestUpdates) -> Result<PathBuf> {
    let path = manifest_path(dest_dir);

    let merged = match fs::read_to_string(&path).await {
        Ok(content) => {
            let mut existing = parse_manifest(&path, &content)?;
            merge_updates(&mut existing, updates);
            existing
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Creating manifest");
            updates.clone()
        }
        Err(err) => return Err(PartError::io(&path, err)),
    };

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|err| PartError::io(dest_dir, err))?;

    let mut content = serde_json::to_string_pretty(&Value::Object(merged))
        .map_err(|source| PartError::ManifestParse {
            path: path.clone(),
            source,
        })?;
    content.push('\n');

    fs::write(&path, content)
        .await
        .map_err(|err| PartError::io(&path, err))?;

    Ok(path)
}

fn parse_manifest(path: &Path, content: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| PartError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PartError::ManifestNotObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Top-level keys are overwritten, except object values present on both
/// sides, which are merged one level deep (update keys win, others are kept).
pub fn merge_updates(manifest: &mut Map<String, Value>, updates: &ManifestUpdates) {
    for (key, update) in updates {
        match (manifest.get_mut(key), update) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                for (nested_key, value) in nested {
                    existing.insert(nested_key.clone(), value.clone());
                }
            }
            _ => {
                manifest.insert(key.clone(), update.clone());
            }
        }
    }
}
