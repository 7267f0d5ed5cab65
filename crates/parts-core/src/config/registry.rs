//! Registry of resolved part configurations

use super::declaration::{ManifestUpdates, PartDeclaration, SrcItem, TemplateVariables};
use crate::error::{PartError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Git reference appended to every source locator
pub const DEFAULT_SOURCE_REF: &str = "master";

/// Where a part's template source lives: `<base>/<id>#<ref>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator {
    pub base: String,
    pub part_id: String,
    pub reference: String,
}

impl SourceLocator {
    pub fn new(base: &str, part_id: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            part_id: part_id.to_string(),
            reference: DEFAULT_SOURCE_REF.to_string(),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.base, self.part_id, self.reference)
    }
}

/// A fully resolved part configuration
#[derive(Debug, Clone)]
pub struct PartConfig {
    pub id: String,
    pub src: SourceLocator,
    pub src_items: Vec<SrcItem>,
    pub description: Option<String>,
    pub suffix_note: Option<String>,
    /// Absolute destination directory
    pub dest_dir: PathBuf,
    pub skip_template: bool,
    pub manifest_updates: Option<ManifestUpdates>,
    pub default_variables: TemplateVariables,
}

impl PartConfig {
    /// Look up a src item. Duplicate ids resolve to the last declared one
    pub fn src_item(&self, id: &str) -> Option<&SrcItem> {
        self.src_items.iter().rev().find(|item| item.id == id)
    }
}

/// Inputs shared by every declaration when building a registry
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Template repository base location, combined with each part id
    pub template_base: String,
    /// Directory that relative destinations are resolved against
    pub working_dir: PathBuf,
}

impl RegistryOptions {
    pub fn new(template_base: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_base: template_base.into(),
            working_dir: working_dir.into(),
        }
    }
}

/// Ordered, immutable lookup from part id to its resolved configuration
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    parts: Vec<PartConfig>,
    index: HashMap<String, usize>,
}

impl PartRegistry {
    /// Resolve every declaration, awaiting default-variable producers.
    ///
    /// A later declaration with an id already seen replaces the earlier one
    /// in place.
    pub async fn define(
        declarations: Vec<PartDeclaration>,
        options: &RegistryOptions,
    ) -> Result<Self> {
        let mut registry = Self::default();

        for declaration in declarations {
            let config = Self::resolve(declaration, options).await?;
            debug!(part = %config.id, src = %config.src, "Registered part config");

            match registry.index.get(&config.id) {
                Some(&position) => registry.parts[position] = config,
                None => {
                    registry
                        .index
                        .insert(config.id.clone(), registry.parts.len());
                    registry.parts.push(config);
                }
            }
        }

        Ok(registry)
    }

    async fn resolve(declaration: PartDeclaration, options: &RegistryOptions) -> Result<PartConfig> {
        let PartDeclaration {
            id,
            src_items,
            description,
            suffix_note,
            dest_dir,
            skip_template,
            manifest_updates,
            default_variables,
        } = declaration;

        let default_variables = match default_variables {
            Some(variables) => variables
                .resolve()
                .await
                .map_err(|source| PartError::VariablesProducer {
                    part: id.clone(),
                    source,
                })?,
            None => TemplateVariables::new(),
        };

        Ok(PartConfig {
            src: SourceLocator::new(&options.template_base, &id),
            dest_dir: resolve_dest_dir(&options.working_dir, dest_dir.as_deref()),
            id,
            src_items,
            description,
            suffix_note,
            skip_template,
            manifest_updates,
            default_variables,
        })
    }

    pub fn get(&self, id: &str) -> Option<&PartConfig> {
        self.index.get(id).map(|&position| &self.parts[position])
    }

    /// Part configs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &PartConfig> {
        self.parts.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn resolve_dest_dir(working_dir: &Path, dest_dir: Option<&Path>) -> PathBuf {
    match dest_dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => working_dir.join(dir),
        None => working_dir.to_path_buf(),
    }
}
