//! Where document text comes from.
//!
//! The loader reads local files, resolves bare module references and fetches
//! remote documents through a [`DocumentSource`]. [`SystemSource`] is backed
//! by `tokio::fs` and `reqwest`; [`MemorySource`] keeps everything in memory
//! for tests and embedding.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, ToqinError};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Reads a local document.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Finds a bare reference (`@acme/tokens/base.json`) in one of
    /// `module_dirs`, walking up from `base_dir`.
    async fn resolve_module(
        &self,
        reference: &str,
        base_dir: &Path,
        module_dirs: &[String],
    ) -> Result<PathBuf>;

    /// Fetches a remote document and returns its whole body.
    async fn http_get(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    async fn read_file(&self, path: &Path) -> Result<String> {
        (**self).read_file(path).await
    }

    async fn resolve_module(
        &self,
        reference: &str,
        base_dir: &Path,
        module_dirs: &[String],
    ) -> Result<PathBuf> {
        (**self).resolve_module(reference, base_dir, module_dirs).await
    }

    async fn http_get(&self, url: &str) -> Result<String> {
        (**self).http_get(url).await
    }
}

/// Candidate paths for a bare reference, nearest directory first.
pub fn module_candidates(reference: &str, base_dir: &Path, module_dirs: &[String]) -> Vec<PathBuf> {
    base_dir
        .ancestors()
        .flat_map(|dir| module_dirs.iter().map(move |m| dir.join(m).join(reference)))
        .collect()
}

fn not_found(reference: &str) -> ToqinError {
    ToqinError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("module \"{reference}\" not found"),
    ))
}

/// Disk and network access.
#[derive(Clone, Debug, Default)]
pub struct SystemSource {
    client: reqwest::Client,
}

impl SystemSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentSource for SystemSource {
    async fn read_file(&self, path: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn resolve_module(
        &self,
        reference: &str,
        base_dir: &Path,
        module_dirs: &[String],
    ) -> Result<PathBuf> {
        for candidate in module_candidates(reference, base_dir, module_dirs) {
            if tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(not_found(reference))
    }

    async fn http_get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Documents held in memory, keyed by path or URL.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: Mutex<HashMap<PathBuf, String>>,
    urls: Mutex<HashMap<String, String>>,
    requests: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert_file(path, content);
        self
    }

    pub fn with_url(self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert_url(url, content);
        self
    }

    /// Adds or replaces a file.
    pub fn insert_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
    }

    pub fn insert_url(&self, url: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut urls) = self.urls.lock() {
            urls.insert(url.into(), content.into());
        }
    }

    /// Number of `http_get` calls served so far.
    pub fn http_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn has_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn read_file(&self, path: &Path) -> Result<String> {
        let content = self
            .files
            .lock()
            .ok()
            .and_then(|files| files.get(path).cloned());

        content.ok_or_else(|| {
            ToqinError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
        })
    }

    async fn resolve_module(
        &self,
        reference: &str,
        base_dir: &Path,
        module_dirs: &[String],
    ) -> Result<PathBuf> {
        module_candidates(reference, base_dir, module_dirs)
            .into_iter()
            .find(|candidate| self.has_file(candidate))
            .ok_or_else(|| not_found(reference))
    }

    async fn http_get(&self, url: &str) -> Result<String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let content = self.urls.lock().ok().and_then(|urls| urls.get(url).cloned());

        content.ok_or_else(|| {
            ToqinError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{url} returned no document"),
            ))
        })
    }
}
