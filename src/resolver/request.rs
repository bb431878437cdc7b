//! Client request for a configuration bundle

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::source::normalize_label;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid name pattern"));

static PROFILES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+(,[A-Za-z0-9._-]+)*$").expect("valid profiles pattern")
});

static LABEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9._/-]|\(_\))+$").expect("valid label pattern"));

/// Identifies one resolution target
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ConfigRequest {
    /// Application name, e.g. `billing`
    #[validate(
        length(min = 1, max = 128, message = "Application must be between 1 and 128 characters"),
        regex(path = *NAME_PATTERN, message = "Application may only contain letters, digits, '.', '_' and '-'")
    )]
    pub application: String,

    /// Profile, or several separated by commas (later ones win)
    #[validate(
        length(min = 1, max = 128, message = "Profile must be between 1 and 128 characters"),
        regex(path = *PROFILES_PATTERN, message = "Profile must be a comma-separated list of names")
    )]
    pub profile: String,

    /// Branch, tag or commit. `(_)` stands for `/`.
    #[validate(
        length(min = 1, max = 128, message = "Label must be between 1 and 128 characters"),
        regex(path = *LABEL_PATTERN, message = "Label may only contain letters, digits, '.', '_', '-', '/' and '(_)'"),
        custom(function = "validate_label")
    )]
    pub label: Option<String>,
}

fn validate_label(label: &str) -> Result<(), ValidationError> {
    let label = normalize_label(label);
    let malformed = label.starts_with('-')
        || label.starts_with('/')
        || label.ends_with('/')
        || label.contains("//")
        || label.contains("..");
    if malformed {
        return Err(ValidationError::new("label")
            .with_message("Label is not a valid reference name".into()));
    }
    Ok(())
}

impl ConfigRequest {
    pub fn new(
        application: impl Into<String>,
        profile: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            application: application.into(),
            profile: profile.into(),
            label,
        }
    }

    /// Listed profiles in request order
    pub fn profiles(&self) -> Vec<&str> {
        self.profile
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Requested label with `(_)` translated, or `default` when none was given
    pub fn label_or(&self, default: &str) -> String {
        match &self.label {
            Some(label) => normalize_label(label),
            None => default.to_string(),
        }
    }
}
