//! Object store trait and a filesystem-backed implementation.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

/// External object store holding uploaded documents and OCR shards.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists at the locator.
    async fn exists(&self, locator: &str) -> StoreResult<bool>;

    /// Read the full object.
    async fn read(&self, locator: &str) -> StoreResult<Vec<u8>>;

    /// List locators starting with `prefix`, sorted by name.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Write an object, replacing any existing one.
    async fn put(&self, locator: &str, content: &[u8], content_type: Option<&str>)
        -> StoreResult<()>;

    /// Human-readable name for this store.
    fn name(&self) -> &str;
}

/// Object store rooted at a local directory.
///
/// Locators are `/`-separated paths relative to the root.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(locator.trim_start_matches("file://"));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if locator.is_empty() || escapes {
            return Err(StoreError::InvalidLocator(locator.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn locator_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, locator: &str) -> StoreResult<bool> {
        let path = self.resolve(locator)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, locator: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(locator)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(locator.to_string())
            } else {
                e.into()
            }
        })
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(locator) = self.locator_for(&path) {
                    if locator.starts_with(prefix) {
                        found.push(locator);
                    }
                }
            }
        }

        found.sort();
        Ok(found)
    }

    async fn put(
        &self,
        locator: &str,
        content: &[u8],
        _content_type: Option<&str>,
    ) -> StoreResult<()> {
        let path = self.resolve(locator)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }
}
