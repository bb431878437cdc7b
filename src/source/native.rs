//! Local-directory configuration source.
//!
//! A label selects a subdirectory of the root when one with that name exists;
//! otherwise the root itself is read.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::source::snapshot::is_config_file;
use crate::source::{ConfigSource, FileContents, Snapshot, SourceError};

pub struct NativeSource {
    root: PathBuf,
}

impl NativeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn directory_for(&self, label: &str) -> PathBuf {
        let candidate = Path::new(label);
        let contained = candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if contained && !label.is_empty() {
            let dir = self.root.join(candidate);
            if dir.is_dir() {
                return dir;
            }
        }
        self.root.clone()
    }
}

#[async_trait]
impl ConfigSource for NativeSource {
    async fn fetch(&self, label: &str) -> Result<Snapshot, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::unavailable(
                label,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        let dir = self.directory_for(label);
        let owned_label = label.to_string();
        let files = tokio::task::spawn_blocking(move || read_tree(&dir))
            .await
            .map_err(|e| SourceError::unavailable(&owned_label, e.to_string()))?
            .map_err(|e| SourceError::unavailable(&owned_label, e.to_string()))?;

        debug!(label = %label, files = files.len(), "Read snapshot from directory");
        Ok(Snapshot::from_contents(label, None, files))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Every supported file below `root`, keyed by `/`-separated relative path
fn read_tree(root: &Path) -> std::io::Result<FileContents> {
    let mut files = FileContents::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if entry.file_name() != ".git" {
                    pending.push(path);
                }
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if is_config_file(&key) {
                files.insert(key, std::fs::read(&path)?);
            }
        }
    }

    Ok(files)
}
