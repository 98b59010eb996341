//! Subcommand implementations.
//!
//! Each command returns the process exit code on success.

pub mod build;
pub mod doctor;
pub mod init;
pub mod sign;

use crate::config::{CONFIG_FILE, ConfigManager};
use crate::error::Result;
use std::path::Path;

/// Loads an explicit config, else the first `apk.toml` found in `dirs`.
pub(crate) fn find_config(explicit: Option<&Path>, dirs: &[&Path]) -> Result<Option<ConfigManager>> {
    if let Some(path) = explicit {
        return Ok(Some(ConfigManager::load(path)?));
    }
    for dir in dirs {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            log::debug!("Using config {}", candidate.display());
            return Ok(Some(ConfigManager::load(&candidate)?));
        }
    }
    Ok(None)
}
