//! Filesystem layout and persistence primitives for one target site.
//!
//! Artifact paths handed out by the store are relative to its root so a
//! whole output directory can be moved between machines.

pub mod errors;
pub mod slug;

pub use errors::StoreError;
pub use slug::{MAX_SLUG_LENGTH, artifact_stem, safe_slug};

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

/// Normalized site identifier: the lowercased host without a leading `www.`.
pub fn site_id(url: &Url) -> String {
    let host = url.host_str().unwrap_or("site").to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

#[derive(Debug, Clone)]
pub struct SiteStore {
    root: PathBuf,
    site: String,
}

impl SiteStore {
    pub fn new(root: impl Into<PathBuf>, site: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            site: site.into(),
        }
    }

    pub fn for_url(root: impl Into<PathBuf>, url: &Url) -> Self {
        Self::new(root, site_id(url))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join(format!("{}_company.json", self.site))
    }

    /// Work tracker state.
    pub fn state_path(&self) -> PathBuf {
        self.root.join(format!("{}_status.json", self.site))
    }

    /// Flat topic list written by earlier versions of the pipeline.
    pub fn legacy_topics_path(&self) -> PathBuf {
        self.root.join(format!("{}_topics.json", self.site))
    }

    pub fn guideline_rel(&self, stem: &str) -> PathBuf {
        Path::new("guidelines").join(format!("{stem}_guideline.txt"))
    }

    pub fn article_rel(&self, stem: &str) -> PathBuf {
        Path::new("blogs").join(format!("{stem}_blog.md"))
    }

    pub fn image_rel(&self, stem: &str, index: usize) -> PathBuf {
        Path::new("images")
            .join(stem)
            .join(format!("image_{index}.png"))
    }

    /// Absolute (or root-relative) location of an artifact path.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// `None` when the file does not exist.
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.read_text(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::json(path, e))
    }

    /// Pretty-printed, written to a sibling temp file and renamed into place.
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(value).map_err(|e| StoreError::json(path, e))?;
        self.write_atomic(path, body.as_bytes())
    }

    /// `None` when the file does not exist.
    pub fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    pub fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        self.write_atomic(path, text.as_bytes())
    }

    pub fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        self.write_atomic(path, bytes)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
    }
}
