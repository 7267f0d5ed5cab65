//! Error types for applying part templates

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while resolving and applying a part template
#[derive(Debug, Error)]
pub enum PartError {
    #[error("Invalid part id: '{0}'")]
    InvalidPartId(String),

    #[error("Part config '{0}' does not exist")]
    PartNotFound(String),

    #[error("Invalid src item id: '{0}'")]
    InvalidSrcItemId(String),

    #[error("Src item '{item}' does not exist in part '{part}'")]
    SrcItemNotFound { part: String, item: String },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to download part template from {locator}: {source:#}")]
    Download {
        locator: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest {} must contain a JSON object", path.display())]
    ManifestNotObject { path: PathBuf },

    #[error("Failed to resolve default variables of part '{part}': {source:#}")]
    VariablesProducer {
        part: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PartError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PartError> = std::result::Result<T, E>;
