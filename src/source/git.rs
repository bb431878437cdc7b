//! Git-backed configuration source using the system `git` binary.
//!
//! The remote is kept as a bare mirror under `basedir`. Each fetch refreshes
//! the mirror, resolves the label to a commit and reads every supported file
//! of that commit's tree.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::source::snapshot::is_config_file;
use crate::source::{ConfigSource, FileContents, Snapshot, SourceError};

const GIT: &str = "git";

/// Mirror of one remote repository
pub struct GitSource {
    uri: String,
    mirror_dir: PathBuf,
    /// Serialises clone/fetch on the mirror; reads run without it
    update_lock: Mutex<()>,
}

impl GitSource {
    pub fn new(uri: impl Into<String>, basedir: impl AsRef<Path>) -> Self {
        Self {
            uri: uri.into(),
            mirror_dir: basedir.as_ref().join("mirror.git"),
            update_lock: Mutex::new(()),
        }
    }

    /// Clone the mirror on first use, fetch afterwards
    async fn update_mirror(&self, label: &str) -> Result<(), SourceError> {
        let _guard = self.update_lock.lock().await;

        if self.mirror_dir.join("HEAD").exists() {
            debug!(uri = %self.uri, "Fetching configuration repository");
            let output = run_git(
                Some(&self.mirror_dir),
                &["fetch", "--prune", "--quiet", "origin"],
            )
            .await
            .map_err(|e| SourceError::unavailable(label, e))?;
            if !output.status.success() {
                return Err(SourceError::unavailable(label, failure("git fetch", &output)));
            }
        } else {
            if let Some(parent) = self.mirror_dir.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SourceError::unavailable(
                        label,
                        format!("cannot create {}: {}", parent.display(), e),
                    )
                })?;
            }
            // A half-finished clone from an earlier crash would block the new one
            if self.mirror_dir.exists() {
                let _ = tokio::fs::remove_dir_all(&self.mirror_dir).await;
            }

            info!(uri = %self.uri, mirror = %self.mirror_dir.display(), "Cloning configuration repository");
            let mirror = self.mirror_dir.to_string_lossy();
            let output = run_git(
                None,
                &["clone", "--mirror", "--quiet", "--", self.uri.as_str(), &*mirror],
            )
            .await
            .map_err(|e| SourceError::unavailable(label, e))?;
            if !output.status.success() {
                let _ = tokio::fs::remove_dir_all(&self.mirror_dir).await;
                return Err(SourceError::unavailable(label, failure("git clone", &output)));
            }
        }

        Ok(())
    }

    async fn resolve_commit(&self, label: &str) -> Result<String, SourceError> {
        let spec = format!("{}^{{commit}}", label);
        let output = run_git(
            Some(&self.mirror_dir),
            &["rev-parse", "--verify", "--quiet", spec.as_str()],
        )
        .await
        .map_err(|e| SourceError::unavailable(label, e))?;

        if !output.status.success() {
            return Err(SourceError::label_not_found(label));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// `(object id, path)` for every supported file in the commit's tree
    async fn list_files(&self, label: &str, commit: &str) -> Result<Vec<(String, String)>, SourceError> {
        let output = run_git(
            Some(&self.mirror_dir),
            &["ls-tree", "-r", "-z", "--full-tree", commit],
        )
        .await
        .map_err(|e| SourceError::unavailable(label, e))?;
        if !output.status.success() {
            return Err(SourceError::unavailable(label, failure("git ls-tree", &output)));
        }
        Ok(parse_ls_tree(&output.stdout))
    }

    async fn read_blobs(
        &self,
        label: &str,
        entries: Vec<(String, String)>,
    ) -> Result<FileContents, SourceError> {
        if entries.is_empty() {
            return Ok(FileContents::default());
        }

        let mut child = Command::new(GIT)
            .arg("-C")
            .arg(&self.mirror_dir)
            .args(["cat-file", "--batch"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::unavailable(label, format!("failed to run git: {}", e)))?;

        let mut input = String::new();
        for (oid, _) in &entries {
            input.push_str(oid);
            input.push('\n');
        }

        // Written from a separate task so a full stdout pipe cannot stall stdin
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let _ = stdin.write_all(input.as_bytes()).await;
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SourceError::unavailable(label, format!("git cat-file failed: {}", e)))?;
        if let Some(writer) = writer {
            let _ = writer.await;
        }
        if !output.status.success() {
            return Err(SourceError::unavailable(label, failure("git cat-file", &output)));
        }

        let blobs = parse_cat_file_batch(&output.stdout);
        let mut files = FileContents::default();
        for ((_, path), blob) in entries.into_iter().zip(blobs) {
            match blob {
                Some(content) => files.insert(path, content.to_vec()),
                None => warn!(label = %label, path = %path, "Object missing from mirror"),
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl ConfigSource for GitSource {
    async fn fetch(&self, label: &str) -> Result<Snapshot, SourceError> {
        self.update_mirror(label).await?;

        let commit = self.resolve_commit(label).await?;
        let entries = self.list_files(label, &commit).await?;
        let files = self.read_blobs(label, entries).await?;

        debug!(label = %label, version = %commit, files = files.len(), "Read snapshot from mirror");
        Ok(Snapshot::from_contents(label, Some(commit), files))
    }

    fn describe(&self) -> String {
        self.uri.clone()
    }
}

/// Run git, optionally inside `dir`. The child is killed if the future is dropped.
async fn run_git(dir: Option<&Path>, args: &[&str]) -> Result<Output, String> {
    let mut command = Command::new(GIT);
    if let Some(dir) = dir {
        command.arg("-C").arg(dir);
    }
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("failed to run git: {}", e))
}

fn failure(what: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{} exited with {}: {}", what, output.status, stderr.trim())
}

/// Parse `git ls-tree -r -z` output, keeping blobs with supported extensions
fn parse_ls_tree(raw: &[u8]) -> Vec<(String, String)> {
    raw.split(|b| *b == 0)
        .filter_map(|entry| {
            let entry = std::str::from_utf8(entry).ok()?;
            let (meta, path) = entry.split_once('\t')?;
            let mut parts = meta.split_whitespace();
            let _mode = parts.next()?;
            let kind = parts.next()?;
            let oid = parts.next()?;
            (kind == "blob" && is_config_file(path)).then(|| (oid.to_string(), path.to_string()))
        })
        .collect()
}

/// Parse `git cat-file --batch` output into one entry per requested object
fn parse_cat_file_batch(raw: &[u8]) -> Vec<Option<&[u8]>> {
    let mut blobs = Vec::new();
    let mut rest = raw;

    while !rest.is_empty() {
        let Some(newline) = rest.iter().position(|b| *b == b'\n') else {
            break;
        };
        let header = String::from_utf8_lossy(&rest[..newline]);
        rest = &rest[newline + 1..];

        let mut parts = header.split_whitespace();
        let _oid = parts.next();
        match (parts.next(), parts.next().and_then(|s| s.parse::<usize>().ok())) {
            (Some(_kind), Some(size)) if rest.len() >= size => {
                blobs.push(Some(&rest[..size]));
                // Content is followed by a single newline
                rest = rest.get(size + 1..).unwrap_or(&[]);
            }
            _ => blobs.push(None),
        }
    }

    blobs
}
