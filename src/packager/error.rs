//! Typed failure model for the packaging pipeline.
//!
//! Every failure raised by the initializer, orchestrator or signer is an
//! [`Error`] carrying a [`ErrorKind`], a human readable message and optional
//! details (trailing tool output, source/destination paths). Messages keep
//! stable literal substrings such as `"No APK files found"` so a presentation
//! layer can match on them.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Result alias used throughout the packager.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid paths or options, e.g. a release build without a keystore.
    Config,
    /// Delegated asset failures (icons, splash screens, web assets).
    Resource,
    /// Toolchain or process failures, artifact discovery and validation.
    Build,
    /// Keystore, signing and verification failures.
    Signing,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Config => "CONFIG",
            ErrorKind::Resource => "RESOURCE",
            ErrorKind::Build => "BUILD",
            ErrorKind::Signing => "SIGNING",
        };
        f.write_str(label)
    }
}

/// Pipeline error: `{kind, message, details}` plus the underlying io error if any.
#[derive(Error, Debug)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    details: Option<String>,
    #[source]
    source: Option<std::io::Error>,
}

impl Error {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Build, message)
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Signing, message)
    }

    /// Attaches details (tool output, paths) to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches the underlying io error.
    pub fn with_source(mut self, source: std::io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Re-labels the error, keeping message and details.
    ///
    /// Used where a lower stage fails inside a higher one, e.g. a process
    /// spawn failure during signing is a signing failure.
    pub fn into_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

/// Adds path context to io results.
pub trait ErrorExt<T> {
    /// Wraps an io failure as a BUILD error mentioning `action` and `path`.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;

    /// Same as [`ErrorExt::fs_context`] with an explicit kind.
    fn fs_context_kind(self, kind: ErrorKind, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.fs_context_kind(ErrorKind::Build, action, path)
    }

    fn fs_context_kind(self, kind: ErrorKind, action: &str, path: &Path) -> Result<T> {
        self.map_err(|e| {
            Error::new(kind, format!("{} failed: {}", action, e))
                .with_details(format!("path: {}", path.display()))
                .with_source(e)
        })
    }
}

/// Returns early with an [`Error`] of the given kind.
///
/// ```ignore
/// bail!(Build, "build failed with exit code {}", code);
/// ```
#[macro_export]
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {
        return Err($crate::packager::Error::new(
            $crate::packager::ErrorKind::$kind,
            format!($($arg)*),
        ))
    };
}
