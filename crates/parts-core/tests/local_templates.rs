//! End-to-end runs against the bundled templates directory

use parts_core::templates::selector::list_files;
use parts_core::{PartApplier, PartRegistry, PartsFile, RegistryOptions, TemplateFetcher};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

async fn registry(fetcher: &TemplateFetcher, work: &TempDir) -> PartRegistry {
    let content = fetcher.fetch_parts_file().await.unwrap();
    let parts_file = PartsFile::from_yaml(&content).unwrap();
    let options = RegistryOptions::new(fetcher.source().base_location(), work.path());
    PartRegistry::define(parts_file.parts, &options).await.unwrap()
}

#[tokio::test]
async fn test_bundled_parts_file_parses() {
    let fetcher = TemplateFetcher::from_local(templates_dir(), "test");
    let work = TempDir::new().unwrap();
    let registry = registry(&fetcher, &work).await;

    assert_eq!(
        registry.ids().collect::<Vec<_>>(),
        vec!["prettier", "vitest", "editorconfig", "node-engines"]
    );
}

#[tokio::test]
async fn test_apply_vitest_renders_and_merges() {
    let fetcher = TemplateFetcher::from_local(templates_dir(), "test");
    let work = TempDir::new().unwrap();
    std::fs::write(
        work.path().join("package.json"),
        r#"{"name":"app","scripts":{"build":"tsc"}}"#,
    )
    .unwrap();
    let registry = registry(&fetcher, &work).await;
    let scratch = TempDir::new().unwrap();

    let report = PartApplier::new(&registry, &fetcher)
        .scratch_root(scratch.path())
        .apply_part_template("vitest", Some("no-examples"), &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(report.copied_files, vec!["vitest.config.ts"]);
    let config = std::fs::read_to_string(work.path().join("vitest.config.ts")).unwrap();
    assert!(config.contains("include: ['tests/**/*.test.ts']"));

    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(work.path().join("package.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["scripts"]["build"], "tsc");
    assert_eq!(manifest["scripts"]["test"], "vitest");
    assert_eq!(manifest["devDependencies"]["vitest"], "^2.1.1");
}

#[tokio::test]
async fn test_apply_prettier_prints_note() {
    let fetcher = TemplateFetcher::from_local(templates_dir(), "test");
    let work = TempDir::new().unwrap();
    let registry = registry(&fetcher, &work).await;
    let scratch = TempDir::new().unwrap();
    let mut out = Vec::new();

    PartApplier::new(&registry, &fetcher)
        .scratch_root(scratch.path())
        .apply_part_template("prettier", None, &mut out)
        .await
        .unwrap();

    assert_eq!(
        list_files(work.path()).unwrap(),
        vec![".prettierignore", ".prettierrc", "package.json"]
    );
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("Run `npm install` to fetch prettier"));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
