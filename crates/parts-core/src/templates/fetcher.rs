//! Part template download from remote (zip over HTTP) or local directory
//!
//! Remote sources host one pre-built zip per part at `<base>/<part-id>.zip`.
//! Local sources keep one folder per part at `<dir>/<part-id>/`. Either way
//! the part's file tree ends up in the scratch directory handed to
//! [`Downloader::download`].

use crate::config::{SourceLocator, PARTS_FILE_NAME};
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use std::future::Future;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Template source - either remote URL or local directory
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Create a remote template source from a product config
    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self> {
        let url_str = std::env::var(config.template_url_env())
            .unwrap_or_else(|_| config.default_template_url().to_string());
        let url =
            Url::parse(&url_str).with_context(|| format!("Invalid template URL: {}", url_str))?;
        Ok(Self::Remote(url))
    }

    /// Create a local template source from a path
    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }

    /// Base location combined with part ids to form source locators
    pub fn base_location(&self) -> String {
        match self {
            TemplateSource::Remote(url) => url.as_str().trim_end_matches('/').to_string(),
            TemplateSource::Local(path) => path.display().to_string(),
        }
    }
}

/// Where a downloaded part came from and where it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedSource {
    pub source: String,
    pub dir: PathBuf,
}

/// Materializes a part template's file tree into a directory
pub trait Downloader {
    fn download(
        &self,
        locator: &SourceLocator,
        dir: &Path,
    ) -> impl Future<Output = Result<DownloadedSource>> + Send;
}

/// Template fetcher - retrieves part templates from remote or local sources
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
}

impl TemplateFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(source: TemplateSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create a fetcher from a product config
    pub fn from_config<C: ProductConfig>(config: &C) -> Result<Self> {
        let source = TemplateSource::from_config(config)?;
        Ok(Self::new(source, config.user_agent()))
    }

    /// Create a fetcher for local templates
    pub fn from_local(path: PathBuf, user_agent: &str) -> Self {
        Self::new(TemplateSource::local(path), user_agent)
    }

    /// Get the template source
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Build a URL by appending a path segment, preserving query parameters
    fn build_url(base: &Url, path_segment: &str) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL cannot have path segments: {}", base))?
            .pop_if_empty()
            .push(path_segment);
        Ok(url)
    }

    /// Fetch the parts file at the root of the template source
    pub async fn fetch_parts_file(&self) -> Result<String> {
        match &self.source {
            TemplateSource::Remote(base_url) => {
                let url = Self::build_url(base_url, PARTS_FILE_NAME)?;
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch parts file from {}", url))?;

                if !response.status().is_success() {
                    anyhow::bail!(
                        "Failed to fetch parts file from {}: HTTP {}",
                        url,
                        response.status()
                    );
                }

                Ok(response.text().await?)
            }
            TemplateSource::Local(path) => {
                let parts_path = path.join(PARTS_FILE_NAME);
                fs::read_to_string(&parts_path)
                    .await
                    .with_context(|| format!("Failed to read {}", parts_path.display()))
            }
        }
    }

    async fn download_remote(
        &self,
        base_url: &Url,
        locator: &SourceLocator,
        dir: &Path,
    ) -> Result<DownloadedSource> {
        let mut zip_url = Self::build_url(base_url, &format!("{}.zip", locator.part_id))?;
        zip_url
            .query_pairs_mut()
            .append_pair("ref", &locator.reference);

        info!(url = %zip_url, "Downloading part template");
        let response = self
            .client
            .get(zip_url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch part zip: {}", locator.part_id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch part '{}' zip from {}: HTTP {}",
                locator.part_id,
                zip_url,
                response.status()
            );
        }

        let zip_bytes = response.bytes().await?.to_vec();
        let written = extract_zip(&zip_bytes, &locator.part_id, dir)?;
        debug!(files = written, "Extracted part template");

        Ok(DownloadedSource {
            source: zip_url.to_string(),
            dir: dir.to_path_buf(),
        })
    }

    fn download_local(
        &self,
        root: &Path,
        locator: &SourceLocator,
        dir: &Path,
    ) -> Result<DownloadedSource> {
        let part_dir = root.join(&locator.part_id);
        if !part_dir.is_dir() {
            anyhow::bail!(
                "Part template '{}' not found in {}",
                locator.part_id,
                root.display()
            );
        }

        info!(path = %part_dir.display(), "Copying local part template");
        for entry in WalkDir::new(&part_dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&part_dir)?;
            let target = dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }

        Ok(DownloadedSource {
            source: part_dir.display().to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

impl Downloader for TemplateFetcher {
    async fn download(&self, locator: &SourceLocator, dir: &Path) -> Result<DownloadedSource> {
        match &self.source {
            TemplateSource::Remote(base_url) => self.download_remote(base_url, locator, dir).await,
            TemplateSource::Local(root) => self.download_local(root, locator, dir),
        }
    }
}

/// Extract a part zip into `dir`, stripping a leading `<part_id>/` folder.
///
/// Returns the number of files written. Entries that would escape `dir`
/// are rejected.
pub fn extract_zip(zip_bytes: &[u8], part_id: &str, dir: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .with_context(|| format!("Failed to read zip archive for part '{}'", part_id))?;

    let prefix = format!("{}/", part_id);
    let mut written = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let full_path = file.name().to_string();
        let relative = full_path.strip_prefix(&prefix).unwrap_or(&full_path);
        let relative = Path::new(relative);

        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            anyhow::bail!("Unsafe path '{}' in part '{}' zip", full_path, part_id);
        }

        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target, &contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }

    Ok(written)
}

/// Build a zip of a local part folder, with entries under `<part_id>/`
pub fn build_local_zip(template_dir: &Path, part_id: &str) -> Result<Vec<u8>> {
    let part_path = template_dir.join(part_id);
    if !part_path.is_dir() {
        anyhow::bail!("Part directory not found: {}", part_path.display());
    }

    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(&part_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&part_path)?;
            let relative: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            let content = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;

            zip.start_file(format!("{}/{}", part_id, relative.join("/")), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
    }

    Ok(zip_buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, file: &str, content: &str) {
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_url_appends_segment() {
        let base = Url::parse("https://example.com/templates/parts").unwrap();
        let url = TemplateFetcher::build_url(&base, "eslint.zip").unwrap();
        assert_eq!(url.as_str(), "https://example.com/templates/parts/eslint.zip");

        let base = Url::parse("https://example.com/parts/?token=abc").unwrap();
        let url = TemplateFetcher::build_url(&base, "parts.yaml").unwrap();
        assert_eq!(url.as_str(), "https://example.com/parts/parts.yaml?token=abc");
    }

    #[test]
    fn test_zip_round_trip_strips_part_prefix() {
        let templates = TempDir::new().unwrap();
        write(templates.path(), "eslint/.eslintrc.json", "{}");
        write(templates.path(), "eslint/config/base.js", "module.exports = {}");

        let bytes = build_local_zip(templates.path(), "eslint").unwrap();
        let scratch = TempDir::new().unwrap();
        let written = extract_zip(&bytes, "eslint", scratch.path()).unwrap();

        assert_eq!(written, 2);
        assert!(scratch.path().join(".eslintrc.json").is_file());
        assert_eq!(
            std::fs::read_to_string(scratch.path().join("config/base.js")).unwrap(),
            "module.exports = {}"
        );
    }

    #[test]
    fn test_extract_rejects_escaping_paths() {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            zip.start_file("../evil.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }

        let scratch = TempDir::new().unwrap();
        let err = extract_zip(&buffer, "eslint", scratch.path()).unwrap_err();
        assert!(err.to_string().contains("Unsafe path"));
    }

    #[tokio::test]
    async fn test_local_download_copies_part_folder() {
        let templates = TempDir::new().unwrap();
        write(templates.path(), "eslint/a.txt", "a");
        write(templates.path(), "eslint/dir/b.txt", "b");
        write(templates.path(), "other/c.txt", "c");

        let fetcher = TemplateFetcher::from_local(templates.path().to_path_buf(), "test");
        let locator = SourceLocator::new(&fetcher.source().base_location(), "eslint");
        let scratch = TempDir::new().unwrap();

        let downloaded = fetcher.download(&locator, scratch.path()).await.unwrap();

        assert_eq!(downloaded.dir, scratch.path());
        assert!(scratch.path().join("a.txt").is_file());
        assert!(scratch.path().join("dir/b.txt").is_file());
        assert!(!scratch.path().join("c.txt").exists());
    }

    #[tokio::test]
    async fn test_local_download_missing_part_fails() {
        let templates = TempDir::new().unwrap();
        let fetcher = TemplateFetcher::from_local(templates.path().to_path_buf(), "test");
        let locator = SourceLocator::new(&fetcher.source().base_location(), "missing");
        let scratch = TempDir::new().unwrap();

        let err = fetcher.download(&locator, scratch.path()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_local_parts_file() {
        let templates = TempDir::new().unwrap();
        write(templates.path(), PARTS_FILE_NAME, "parts: []\n");

        let fetcher = TemplateFetcher::from_local(templates.path().to_path_buf(), "test");
        assert_eq!(fetcher.fetch_parts_file().await.unwrap(), "parts: []\n");
    }
}
