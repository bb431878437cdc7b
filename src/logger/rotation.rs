//! Size-based rotation of the log file
//!
//! `app.log` is renamed to `app.log.1`, older files shift up by one and
//! anything beyond `max_files` is removed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::logger::config::RotationConfig;
use crate::logger::error::LoggerError;

pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    /// Shift rotated files and move the active file to `.1`
    pub fn rotate(&self, current_path: &Path) -> Result<(), LoggerError> {
        let oldest = rotated_path(current_path, self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for index in (1..self.config.max_files).rev() {
            let from = rotated_path(current_path, index);
            if from.exists() {
                fs::rename(&from, rotated_path(current_path, index + 1))?;
            }
        }

        if current_path.exists() {
            fs::rename(current_path, rotated_path(current_path, 1)).map_err(|e| {
                LoggerError::rotation(format!(
                    "Failed to rotate {}: {}",
                    current_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

fn rotated_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}", index));
    base.with_file_name(name)
}
