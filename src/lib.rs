//! Android APK packager library
//!
//! This library packages a directory of static web assets into an
//! installable Android APK:
//! - Capacitor project creation and syncing
//! - Gradle (or Capacitor CLI) builds with classified output
//! - APK signing and verification with `apksigner`
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod error;
pub mod packager;

// Re-export commonly used types
pub use error::{AppError, CliError, Result};
