//! Main build orchestration.
//!
//! This module provides the [`BuildOrchestrator`] that turns a prepared
//! native project into a validated APK in the caller's output directory.

use super::{
    arguments::{apk_output_dir, build_invocation},
    artifacts::{BuildArtifact, discover_artifact, relocate_artifact, validate_artifact},
    checksum::calculate_sha256,
    output::{LineClass, OutputClassifier},
    steps::{BuildStep, StepTracker},
};
use crate::packager::{
    BuildOptions, Error, Result,
    utils::fs::{FileSystem, TokioFileSystem},
    utils::process::{OutputLine, ProcessRunner, TokioProcessRunner},
};
use path_absolutize::Absolutize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of trailing stderr lines attached to a failed build.
const STDERR_TAIL: usize = 50;

/// Callback receiving low-priority progress lines.
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The relocated artifact; `artifact.path` is inside `output_dir`.
    pub artifact: BuildArtifact,
    pub steps: Vec<BuildStep>,
}

/// Build orchestrator.
///
/// Drives one external build per call and never retries: builds are
/// expensive and not guaranteed idempotent, so retry policy (for example
/// re-running after a clean) belongs to the caller. Only one build may run
/// per project directory at a time; callers serialize.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_apk::packager::{BuildOrchestrator, BuildOptionsBuilder};
///
/// # async fn example() -> kodegen_bundler_apk::packager::Result<()> {
/// let options = BuildOptionsBuilder::new().output_dir("dist").build()?;
/// let apk = BuildOrchestrator::new().build_apk("my-app".as_ref(), &options).await?;
/// println!("APK at {}", apk.display());
/// # Ok(())
/// # }
/// ```
pub struct BuildOrchestrator {
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildOrchestrator {
    /// Orchestrator using real processes and the real file system.
    pub fn new() -> Self {
        Self::with_capabilities(Arc::new(TokioProcessRunner), Arc::new(TokioFileSystem))
    }

    pub fn with_capabilities(runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            runner,
            fs,
            progress: None,
        }
    }

    /// Forwards every progress line of the build to `progress`.
    pub fn on_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Builds and returns the path of the relocated APK.
    pub async fn build_apk(&self, project: &Path, options: &BuildOptions) -> Result<PathBuf> {
        Ok(self.build(project, options).await?.artifact.path)
    }

    /// Builds and returns the artifact with step telemetry.
    ///
    /// # Errors
    ///
    /// - CONFIG when the options are invalid (checked before spawning)
    /// - BUILD for a missing project, toolchain failure, timeout, missing or
    ///   empty APK, or a failed copy
    pub async fn build(&self, project: &Path, options: &BuildOptions) -> Result<BuildOutcome> {
        options.validate()?;
        let build_type = options.build_type();
        let mut steps = StepTracker::new();

        let step = steps.begin("verify project");
        let project = steps.finish(step, self.resolve_project(project).await)?;

        log::info!(
            "Building {} APK for {} with {}",
            build_type,
            project.display(),
            options.build_tool
        );

        let step = steps.begin("assemble");
        let assembled = self.assemble(&project, options).await;
        steps.finish(step, assembled)?;

        let step = steps.begin("discover artifact");
        let scan_dir = apk_output_dir(&project, build_type);
        let discovered = discover_artifact(self.fs.as_ref(), &scan_dir, build_type).await;
        let discovered = steps.finish(step, discovered)?;

        let step = steps.begin("validate artifact");
        let validated = validate_artifact(self.fs.as_ref(), &discovered, build_type).await;
        let mut artifact = steps.finish(step, validated)?;

        let step = steps.begin("relocate artifact");
        let relocated = relocate_artifact(self.fs.as_ref(), &artifact, &options.output_dir).await;
        artifact.path = steps.finish(step, relocated)?;

        artifact.checksum = match calculate_sha256(&artifact.path).await {
            Ok(sum) => Some(sum),
            Err(e) => {
                log::warn!("Could not checksum {}: {}", artifact.path.display(), e);
                None
            }
        };

        log::info!(
            "✓ Built {} ({} bytes{})",
            artifact.path.display(),
            artifact.size_bytes,
            artifact
                .checksum
                .as_deref()
                .map(|c| format!(", sha256 {}", c))
                .unwrap_or_default()
        );

        Ok(BuildOutcome {
            artifact,
            steps: steps.into_steps(),
        })
    }

    /// Resolves `project` to one absolute directory and checks it exists.
    async fn resolve_project(&self, project: &Path) -> Result<PathBuf> {
        let resolved = project
            .absolutize()
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| project.to_path_buf());

        match self.fs.metadata(&resolved).await {
            Ok(info) if info.is_dir => Ok(resolved),
            _ => Err(Error::build(format!("project not found: {}", resolved.display()))),
        }
    }

    /// Runs the toolchain and turns a non-zero exit into a diagnosis.
    async fn assemble(&self, project: &Path, options: &BuildOptions) -> Result<()> {
        let invocation = build_invocation(project, options);
        log::info!("Running `{}` in {}", invocation, invocation.working_dir().display());

        let mut classifier = OutputClassifier::new();
        let progress = self.progress.clone();
        let result = self
            .runner
            .run(&invocation, &mut |line: &OutputLine| match classifier.observe(line) {
                LineClass::Progress => {
                    log::trace!("[{}] {}", classifier.current_task().unwrap_or("-"), line.text);
                    if let Some(progress) = &progress {
                        progress(line.text.as_str());
                    }
                }
                LineClass::Success | LineClass::FailureStatus => log::info!("{}", line.text),
                LineClass::FailureDetail => log::warn!("{}", line.text),
            })
            .await?;

        log::debug!(
            "toolchain exited {} after {} progress lines (last task {})",
            result.exit_code,
            classifier.progress_lines(),
            classifier.current_task().unwrap_or("none")
        );
        let output = classifier.finish();
        if result.success() {
            if !output.reported_success() {
                log::debug!("toolchain exited 0 without a success marker");
            }
            return Ok(());
        }

        let message = match output.first_failure() {
            Some(block) => block.to_string(),
            None => format!("build failed with exit code {}", result.exit_code),
        };
        Err(Error::build(message).with_details(result.trailing_stderr(STDERR_TAIL)))
    }
}
