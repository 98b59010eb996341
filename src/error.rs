//! Error types for the command line tool.
//!
//! Library failures arrive as [`packager::Error`](crate::packager::Error);
//! this module wraps them with CLI failures and maps known messages to
//! recovery suggestions.

use crate::packager::{self, ErrorKind};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Main error type of the binary
#[derive(Error, Debug)]
pub enum AppError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Packaging pipeline errors
    #[error("{0}")]
    Packager(#[from] packager::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Required external tools are not installed
    #[error("Missing tools: {tools:?}")]
    MissingTools {
        /// Tool names
        tools: Vec<String>,
    },
}

impl AppError {
    /// Kind of the underlying pipeline error, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Packager(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Extra diagnostic text (tool stderr, paths) attached to the error.
    pub fn details(&self) -> Option<&str> {
        match self {
            AppError::Packager(e) => e.details(),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let message = self.to_string();
        let mut suggestions = Vec::new();

        if message.contains("No APK files found") {
            suggestions.push("Run `./gradlew clean` in the android/ directory and build again".to_string());
            suggestions.push("Check that the build variant produces an APK rather than an AAB".to_string());
        }
        if message.contains("APK file is empty") {
            suggestions.push("Delete android/app/build and rebuild; the previous build was interrupted".to_string());
        }
        if message.contains("project not found") {
            suggestions.push("Run `kodegen_bundler_apk init` to create the Android project first".to_string());
        }
        if message.contains("keystore") {
            suggestions.push(
                "Pass --keystore/--key-alias or add a [keystore] table to apk.toml".to_string(),
            );
            suggestions.push(format!(
                "Provide the password via {} instead of the command line",
                crate::config::KEYSTORE_PASSWORD_ENV
            ));
        }
        if message.contains("timed out") {
            suggestions.push("Raise [build].timeout_secs or pass --timeout 0 to disable it".to_string());
        }
        if message.contains("failed to start") || matches!(self, AppError::Cli(CliError::MissingTools { .. })) {
            suggestions.push("Run `kodegen_bundler_apk doctor` to check the required tools".to_string());
        }

        match self.kind() {
            Some(ErrorKind::Signing) if suggestions.is_empty() => {
                suggestions.push("Verify the keystore alias and passwords with `keytool -list -keystore <path>`".to_string());
            }
            Some(ErrorKind::Resource) => {
                suggestions.push("Check that web_dir contains index.html and images are PNG files".to_string());
            }
            _ => {}
        }

        if suggestions.is_empty() {
            suggestions.push("Re-run with RUST_LOG=debug for the full toolchain output".to_string());
        }
        suggestions
    }
}
