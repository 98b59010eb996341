//! End-to-end packaging facade.
//!
//! [`Pipeline`] strings the components together in the only order that
//! works: create, install, add platform, place resources, sync, build and,
//! for release builds, sign.

use crate::bail;
use crate::packager::{
    AppConfig, BuildOptions, ErrorExt, KeystoreConfig, Result,
    builder::{BuildOrchestrator, BuildOutcome, ProgressFn, checksum::calculate_sha256},
    project::{ProjectInitializer, ProjectState},
    resources::{FsResourceProcessor, ResourceProcessor},
    signing::ArtifactSigner,
    utils::fs::{FileSystem, TokioFileSystem, remove_file_if_exists},
    utils::process::{ProcessRunner, TokioProcessRunner},
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Packages a static web bundle into an APK.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_apk::packager::{AppConfig, BuildOptionsBuilder, Pipeline};
///
/// # async fn example() -> kodegen_bundler_apk::packager::Result<()> {
/// let pipeline = Pipeline::new();
/// let config = AppConfig::new("com.example.todo", "Todo", "dist");
/// pipeline.initialize_project(&config, "todo-android".as_ref()).await?;
///
/// let options = BuildOptionsBuilder::new().output_dir("out").build()?;
/// let apk = pipeline.build_apk("todo-android".as_ref(), &options).await?;
/// println!("{}", apk.display());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
    resources: Arc<dyn ResourceProcessor>,
    signer: ArtifactSigner,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_capabilities(Arc::new(TokioProcessRunner), Arc::new(TokioFileSystem))
    }

    /// Pipeline whose every process and file operation goes through the given capabilities.
    pub fn with_capabilities(runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            signer: ArtifactSigner::with_capabilities(runner.clone(), fs.clone()),
            resources: Arc::new(FsResourceProcessor::new(fs.clone())),
            runner,
            fs,
            progress: None,
        }
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceProcessor>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_signer(mut self, signer: ArtifactSigner) -> Self {
        self.signer = signer;
        self
    }

    pub fn on_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn signer(&self) -> &ArtifactSigner {
        &self.signer
    }

    /// Creates the project at `path` and leaves it synced with `config.web_dir`.
    pub async fn initialize_project(&self, config: &AppConfig, path: &Path) -> Result<ProjectState> {
        config.validate()?;

        let mut project = ProjectInitializer::new(path, self.runner.clone(), self.fs.clone());
        project.create_project(config).await?;
        project.install_dependencies(&config.plugins).await?;
        project.add_android_platform().await?;
        self.place_resources(config, path).await?;
        project.sync_project().await?;

        log::info!("✓ Project ready at {}", path.display());
        Ok(project.state())
    }

    /// Copies fresh web assets, icon and splash into an existing project.
    ///
    /// The next [`Pipeline::build_apk`] syncs them into the native tree.
    pub async fn refresh_web_assets(&self, config: &AppConfig, path: &Path) -> Result<()> {
        config.validate()?;
        self.place_resources(config, path).await
    }

    async fn place_resources(&self, config: &AppConfig, path: &Path) -> Result<()> {
        self.resources.copy_web_assets(&config.web_dir, path).await?;
        if let Some(icon) = &config.icon {
            self.resources.process_icon(icon, path).await?;
        }
        if let Some(splash) = &config.splash {
            self.resources.generate_splash_screens(splash, path).await?;
        }
        Ok(())
    }

    /// Syncs, builds and (for release) signs; returns the final APK path.
    pub async fn build_apk(&self, path: &Path, options: &BuildOptions) -> Result<PathBuf> {
        Ok(self.build(path, options).await?.artifact.path)
    }

    /// Same as [`Pipeline::build_apk`] with the build telemetry.
    pub async fn build(&self, path: &Path, options: &BuildOptions) -> Result<BuildOutcome> {
        options.validate()?;
        if !self.fs.exists(path).await {
            bail!(Build, "project not found: {}", path.display());
        }

        let mut project = ProjectInitializer::open(path, self.runner.clone(), self.fs.clone()).await;
        project.sync_project().await?;
        project.mark_ready().await?;

        let mut orchestrator = BuildOrchestrator::with_capabilities(self.runner.clone(), self.fs.clone());
        if let Some(progress) = &self.progress {
            orchestrator = orchestrator.on_progress(progress.clone());
        }
        let mut outcome = orchestrator.build(project.root(), options).await?;

        if let Some(keystore) = options.keystore.as_ref().filter(|_| options.release) {
            outcome.artifact.path = match self.sign_apk(&outcome.artifact.path, keystore).await {
                Ok(signed) => signed,
                Err(e) => {
                    // An unsigned release APK must not be left behind as the output.
                    if let Err(cleanup) = remove_file_if_exists(self.fs.as_ref(), &outcome.artifact.path).await {
                        log::warn!("Could not remove {}: {}", outcome.artifact.path.display(), cleanup);
                    }
                    return Err(e);
                }
            };
            outcome.artifact.size_bytes = self
                .fs
                .metadata(&outcome.artifact.path)
                .await
                .fs_context("reading signed APK", &outcome.artifact.path)?
                .len;
            outcome.artifact.checksum = match calculate_sha256(&outcome.artifact.path).await {
                Ok(sum) => Some(sum),
                Err(e) => {
                    log::warn!("Could not checksum {}: {}", outcome.artifact.path.display(), e);
                    None
                }
            };
        }
        Ok(outcome)
    }

    /// Signs `apk` in place with `keystore`.
    pub async fn sign_apk(&self, apk: &Path, keystore: &KeystoreConfig) -> Result<PathBuf> {
        self.signer.sign_apk(apk, keystore).await
    }
}
