//! Part declarations and the registry they resolve into
//!
//! Declarations come either from code (builder methods on
//! [`PartDeclaration`]) or from a `parts.yaml` file ([`PartsFile`]).
//! [`PartRegistry::define`] resolves them once per invocation.

pub mod declaration;
pub mod registry;

pub use declaration::{
    DefaultVariables, ManifestUpdates, PartDeclaration, PartsFile, Patterns, SrcItem,
    TemplateVariables,
};
pub use registry::{PartConfig, PartRegistry, RegistryOptions, SourceLocator};

/// File name of the parts file, locally or at the template source root
pub const PARTS_FILE_NAME: &str = "parts.yaml";
