//! Candidate file selection by naming convention.
//!
//! For application `app` and profile `p` the candidates, highest precedence
//! first, are `app-p`, `app`, `application-p` and `application`.

use crate::source::{SUPPORTED_EXTENSIONS, Snapshot};

/// Base name shared by every application
pub const DEFAULT_NAME: &str = "application";

/// Placeholder expanded in search paths
pub const APPLICATION_PLACEHOLDER: &str = "{application}";

/// Precedence rank of a layer; lower wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    ApplicationProfile = 0,
    Application = 1,
    DefaultProfile = 2,
    Default = 3,
}

impl Rank {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// A file chosen to become a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub rank: Rank,
}

/// Base names in precedence order. Later profiles come before earlier ones.
pub fn base_names(application: &str, profiles: &[&str]) -> Vec<(Rank, String)> {
    let mut names = Vec::new();
    for profile in profiles.iter().rev() {
        names.push((Rank::ApplicationProfile, format!("{}-{}", application, profile)));
    }
    names.push((Rank::Application, application.to_string()));
    for profile in profiles.iter().rev() {
        names.push((Rank::DefaultProfile, format!("{}-{}", DEFAULT_NAME, profile)));
    }
    names.push((Rank::Default, DEFAULT_NAME.to_string()));
    names
}

/// Directories searched, root first. Blank and duplicate entries are dropped.
pub fn search_directories(search_paths: &[String], application: &str) -> Vec<String> {
    let mut directories = vec![String::new()];
    for path in search_paths {
        let expanded = path.replace(APPLICATION_PLACEHOLDER, application);
        let trimmed = expanded.trim().trim_matches('/').to_string();
        if !directories.contains(&trimmed) {
            directories.push(trimmed);
        }
    }
    directories
}

/// Files of `snapshot` that contribute to the request, highest precedence first.
///
/// Within one base name and directory the first existing extension in
/// [`SUPPORTED_EXTENSIONS`] order is taken. A file matched more than once
/// (as happens when the application is itself called `application`) keeps
/// only its highest-precedence position.
pub fn select(
    snapshot: &Snapshot,
    application: &str,
    profiles: &[&str],
    search_paths: &[String],
) -> Vec<Candidate> {
    let directories = search_directories(search_paths, application);
    let mut selected: Vec<Candidate> = Vec::new();

    for (rank, base) in base_names(application, profiles) {
        for directory in &directories {
            let found = SUPPORTED_EXTENSIONS.iter().find_map(|ext| {
                let path = if directory.is_empty() {
                    format!("{}.{}", base, ext)
                } else {
                    format!("{}/{}.{}", directory, base, ext)
                };
                snapshot.contains(&path).then_some(path)
            });

            if let Some(path) = found
                && !selected.iter().any(|c| c.path == path)
            {
                selected.push(Candidate { path, rank });
            }
        }
    }

    selected
}
