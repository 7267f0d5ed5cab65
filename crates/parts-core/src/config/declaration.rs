//! Part declarations as written by the author of a parts file

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Template variables, keyed by variable name
pub type TemplateVariables = serde_json::Map<String, serde_json::Value>;

/// Manifest fields merged into the destination's package.json
pub type ManifestUpdates = serde_json::Map<String, serde_json::Value>;

/// Future returned by a default-variables producer
pub type VariablesFuture = Pin<Box<dyn Future<Output = anyhow::Result<TemplateVariables>> + Send>>;

type Producer = Box<dyn FnOnce() -> VariablesFuture + Send>;

/// Glob pattern(s) for a src item: either a single pattern or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Patterns::One(pattern) => std::slice::from_ref(pattern),
            Patterns::Many(patterns) => patterns.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Patterns::One(_) => false,
            Patterns::Many(patterns) => patterns.is_empty(),
        }
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Patterns::One(pattern.to_string())
    }
}

impl From<Vec<&str>> for Patterns {
    fn from(patterns: Vec<&str>) -> Self {
        Patterns::Many(patterns.into_iter().map(str::to_string).collect())
    }
}

/// A named file selection rule within a part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcItem {
    /// Src item id
    pub id: String,

    /// Glob patterns of files to include. All files are included when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Patterns>,

    /// Glob patterns of files to exclude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Patterns>,
}

impl SrcItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            include: None,
            exclude: None,
        }
    }

    pub fn include(mut self, patterns: impl Into<Patterns>) -> Self {
        self.include = Some(patterns.into());
        self
    }

    pub fn exclude(mut self, patterns: impl Into<Patterns>) -> Self {
        self.exclude = Some(patterns.into());
        self
    }
}

/// Default template variables: a plain value, or a producer resolved when
/// the registry is built
pub enum DefaultVariables {
    Static(TemplateVariables),
    Producer(Producer),
}

impl DefaultVariables {
    /// Wrap a synchronous producer; it is not called until the registry is built
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<TemplateVariables> + Send + 'static,
    {
        Self::Producer(Box::new(move || -> VariablesFuture {
            let result = f();
            Box::pin(async move { result })
        }))
    }

    /// Wrap an asynchronous producer
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<TemplateVariables>> + Send + 'static,
    {
        Self::Producer(Box::new(move || -> VariablesFuture { Box::pin(f()) }))
    }

    pub(crate) async fn resolve(self) -> anyhow::Result<TemplateVariables> {
        match self {
            DefaultVariables::Static(variables) => Ok(variables),
            DefaultVariables::Producer(producer) => producer().await,
        }
    }
}

impl fmt::Debug for DefaultVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultVariables::Static(variables) => {
                f.debug_tuple("Static").field(variables).finish()
            }
            DefaultVariables::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<TemplateVariables> for DefaultVariables {
    fn from(variables: TemplateVariables) -> Self {
        DefaultVariables::Static(variables)
    }
}

impl<'de> Deserialize<'de> for DefaultVariables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        TemplateVariables::deserialize(deserializer).map(DefaultVariables::Static)
    }
}

/// A part as declared in a parts file, before resolution
#[derive(Debug, Default, Deserialize)]
pub struct PartDeclaration {
    /// Part id. Must match the part's folder name in the template source
    pub id: String,

    /// Selection rules; all files are copied when no rule is requested
    #[serde(default)]
    pub src_items: Vec<SrcItem>,

    #[serde(default)]
    pub description: Option<String>,

    /// Printed after the part has been applied
    #[serde(default)]
    pub suffix_note: Option<String>,

    /// Destination, relative to the working directory (defaults to it)
    #[serde(default)]
    pub dest_dir: Option<PathBuf>,

    /// Skip download and copy; only side effects such as manifest updates run
    #[serde(default)]
    pub skip_template: bool,

    /// Fields merged into package.json, which is created if missing
    #[serde(default, alias = "package_json_updates")]
    pub manifest_updates: Option<ManifestUpdates>,

    #[serde(default)]
    pub default_variables: Option<DefaultVariables>,
}

impl PartDeclaration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn src_item(mut self, item: SrcItem) -> Self {
        self.src_items.push(item);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn suffix_note(mut self, note: impl Into<String>) -> Self {
        self.suffix_note = Some(note.into());
        self
    }

    pub fn dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = Some(dir.into());
        self
    }

    pub fn skip_template(mut self, skip: bool) -> Self {
        self.skip_template = skip;
        self
    }

    pub fn manifest_updates(mut self, updates: ManifestUpdates) -> Self {
        self.manifest_updates = Some(updates);
        self
    }

    pub fn default_variables(mut self, variables: impl Into<DefaultVariables>) -> Self {
        self.default_variables = Some(variables.into());
        self
    }
}

/// Parts file (parts.yaml) listing the available part declarations
#[derive(Debug, Default, Deserialize)]
pub struct PartsFile {
    /// Oldest CLI version the declarations were written for
    #[serde(default)]
    pub min_cli_version: Option<String>,

    #[serde(default)]
    pub parts: Vec<PartDeclaration>,
}

impl PartsFile {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_accept_string_or_list() {
        let one: Patterns = serde_yaml::from_str("\"src/**\"").unwrap();
        let many: Patterns = serde_yaml::from_str("[\"src/**\", \"*.md\"]").unwrap();

        assert_eq!(one.iter().collect::<Vec<_>>(), vec!["src/**"]);
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["src/**", "*.md"]);
        assert!(Patterns::Many(vec![]).is_empty());
    }

    #[test]
    fn test_parts_file_from_yaml() {
        let yaml = r#"
min_cli_version: "0.1.0"
parts:
  - id: eslint
    description: ESLint setup
    suffix_note: Run npm install
    src_items:
      - id: config-only
        include: ".eslintrc.*"
        exclude: ["**/*.bak"]
    package_json_updates:
      devDependencies:
        eslint: "^9.0.0"
    default_variables:
      name: demo
  - id: deps-only
    skip_template: true
"#;
        let file = PartsFile::from_yaml(yaml).unwrap();

        assert_eq!(file.min_cli_version.as_deref(), Some("0.1.0"));
        assert_eq!(file.parts.len(), 2);

        let eslint = &file.parts[0];
        assert_eq!(eslint.id, "eslint");
        assert_eq!(eslint.src_items[0].include, Some(Patterns::from(".eslintrc.*")));
        assert_eq!(
            eslint.src_items[0].exclude,
            Some(Patterns::from(vec!["**/*.bak"]))
        );
        assert!(eslint.manifest_updates.as_ref().unwrap().contains_key("devDependencies"));
        assert!(matches!(
            eslint.default_variables,
            Some(DefaultVariables::Static(ref vars)) if vars["name"] == "demo"
        ));

        assert!(file.parts[1].skip_template);
        assert!(file.parts[1].src_items.is_empty());
    }

    #[tokio::test]
    async fn test_producers_are_lazy_until_resolved() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = called.clone();
        let vars = DefaultVariables::from_fn(move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(TemplateVariables::new())
        });

        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
        vars.resolve().await.unwrap();
        assert!(called.load(std::sync::atomic::Ordering::SeqCst));
    }
}
