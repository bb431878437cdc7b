//! Configuration files captured at one label

use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// File extensions that make up a snapshot, in lookup preference order
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["properties", "yml", "yaml", "toml", "json"];

/// The set of configuration files at one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub label: String,
    /// Commit id the label resolved to, when the backend knows one
    pub version: Option<String>,
    pub fetched_at: Timestamp,
    /// Repository-relative path (`/`-separated) to file contents
    pub files: BTreeMap<String, String>,
    /// Files that exist at this label but are not UTF-8, with the decode error.
    /// They only fail requests that select them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub undecodable: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new(
        label: impl Into<String>,
        version: Option<String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            label: label.into(),
            version,
            fetched_at: Timestamp::now(),
            files,
            undecodable: BTreeMap::new(),
        }
    }

    pub fn from_contents(label: impl Into<String>, version: Option<String>, contents: FileContents) -> Self {
        Self {
            undecodable: contents.undecodable,
            ..Self::new(label, version, contents.files)
        }
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Decode error of `path` when the file exists but is not UTF-8
    pub fn undecodable(&self, path: &str) -> Option<&str> {
        self.undecodable.get(path).map(String::as_str)
    }

    /// Whether `path` exists at this label, readable or not
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.undecodable.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.undecodable.is_empty()
    }

    /// Whether the snapshot is younger than `max_age_secs`
    pub fn is_fresh(&self, max_age_secs: u64) -> bool {
        if max_age_secs == 0 {
            return false;
        }
        let age = Timestamp::now().duration_since(self.fetched_at);
        let max_age = SignedDuration::from_secs(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
        !age.is_negative() && age < max_age
    }
}

/// Raw file bytes decoded the same way by every backend
#[derive(Debug, Default)]
pub struct FileContents {
    files: BTreeMap<String, String>,
    undecodable: BTreeMap<String, String>,
}

impl FileContents {
    /// Keep `bytes` as text when they are UTF-8, otherwise record why not
    pub fn insert(&mut self, path: String, bytes: Vec<u8>) {
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.files.insert(path, text);
            }
            Err(e) => {
                let reason = format!("not valid UTF-8: {}", e.utf8_error());
                warn!(path = %path, reason = %reason, "Configuration file cannot be decoded");
                self.undecodable.insert(path, reason);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a repository path has one of the supported extensions
pub fn is_config_file(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| SUPPORTED_EXTENSIONS.contains(&ext))
}
