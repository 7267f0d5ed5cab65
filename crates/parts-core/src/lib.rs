//! Parts Core - Shared library for applying part templates
//!
//! A part is a named, reusable template snippet that is copied into an
//! existing project. This library resolves part declarations into a
//! registry, downloads a part's template source into a scratch directory,
//! selects files with glob include/exclude rules, copies them into the
//! destination and merges declared updates into its package.json.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Registry construction, file selection,
//!   copying, manifest merging, template download
//! - **Layer 2: Workflow Orchestration** - `PartApplier` and the
//!   `ProductConfig` trait for binaries
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use parts_core::{PartApplier, PartDeclaration, PartRegistry, RegistryOptions, SrcItem};
//! use parts_core::templates::TemplateFetcher;
//!
//! let fetcher = TemplateFetcher::from_config(&MyConfig)?;
//! let options = RegistryOptions::new(fetcher.source().base_location(), std::env::current_dir()?);
//! let registry = PartRegistry::define(
//!     vec![PartDeclaration::new("eslint").src_item(SrcItem::new("config").include(".eslintrc.*"))],
//!     &options,
//! )
//! .await?;
//!
//! PartApplier::new(&registry, &fetcher)
//!     .apply_part_template("eslint", Some("config"), &mut std::io::stdout())
//!     .await?;
//! ```

pub mod apply;
pub mod config;
pub mod error;
pub mod product;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use apply::{is_valid_id, ApplyReport, PartApplier};
pub use config::{
    DefaultVariables, PartConfig, PartDeclaration, PartRegistry, PartsFile, Patterns,
    RegistryOptions, SrcItem, TemplateVariables,
};
pub use error::PartError;
pub use product::ProductConfig;
pub use templates::{select_files, Downloader, TemplateFetcher, TemplateSource};

#[cfg(feature = "tui")]
pub use tui::run;
