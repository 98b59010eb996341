//! Android APK packaging pipeline.
//!
//! Turns a directory of static web assets into an installable APK by
//! driving the Capacitor CLI, Gradle, `keytool` and `apksigner`.
//!
//! # Components
//!
//! - [`ProjectInitializer`] creates and syncs the Capacitor project
//! - [`BuildOrchestrator`] runs the build and collects the APK
//! - [`ArtifactSigner`] manages keystores, signs and verifies
//! - [`Pipeline`] runs all of them in order
//!
//! Every external process goes through an injected [`ProcessRunner`] and
//! every artifact file operation through a [`FileSystem`], so the whole
//! pipeline can be driven by [`testing`] doubles.
//!
//! # Errors
//!
//! All operations return [`Error`], tagged with an [`ErrorKind`]:
//! CONFIG, RESOURCE, BUILD or SIGNING.

pub mod builder;
mod error;
pub mod pipeline;
pub mod project;
pub mod resources;
pub mod settings;
pub mod signing;
pub mod testing;
pub mod tool_detection;
pub mod utils;

pub use builder::{BuildArtifact, BuildOrchestrator, BuildOutcome, BuildStep, StepStatus};
pub use error::{Error, ErrorExt, ErrorKind, Result};
pub use pipeline::Pipeline;
pub use project::{ProjectInitializer, ProjectState};
pub use resources::{FsResourceProcessor, ResourceProcessor};
pub use settings::{AppConfig, BuildOptions, BuildOptionsBuilder, BuildTool, BuildType, KeystoreConfig};
pub use signing::ArtifactSigner;
pub use utils::fs::{FileSystem, TokioFileSystem};
pub use utils::process::{Invocation, ProcessResult, ProcessRunner, TokioProcessRunner};
