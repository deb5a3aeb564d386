//! Object store backed by a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ObjectStore, StoreError};

/// Treats every file below `root` as an object keyed by its `/`-joined
/// relative path.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StoreError::InvalidKey {
                    key: key.to_string(),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|source| StoreError::io(&dir, source))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|source| StoreError::io(&dir, source))?
            {
                let Ok(name) = entry.file_name().into_string() else {
                    warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                    continue;
                };
                let key = if dir_key.is_empty() {
                    name
                } else {
                    format!("{dir_key}/{name}")
                };

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|source| StoreError::io(entry.path(), source))?;
                if file_type.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        debug!(root = %self.root.display(), prefix, count = keys.len(), "Listed local objects");
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|source| StoreError::io(path, source))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
