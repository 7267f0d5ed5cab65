//! Product configuration trait for CLI binaries
//!
//! This trait defines the interface a binary implements to point the
//! applier at its part template repository.

/// Configuration trait for CLI products that apply part templates
///
/// Each product defines:
/// - Product identity (name, display name)
/// - Template repository location
/// - Upgrade instructions shown in version warnings
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default base URL of the part template repository
    fn default_template_url(&self) -> &'static str;

    /// Environment variable name for overriding template URL
    fn template_url_env(&self) -> &'static str;

    /// Environment variable name for overriding the parts file path
    fn parts_file_env(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
