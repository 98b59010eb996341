//! Native project skeleton lifecycle.
//!
//! A project moves through [`ProjectState`] one successful step at a time:
//!
//! ```text
//! Uninitialized -> Created -> PlatformAdded -> Synced -> Ready
//! ```
//!
//! A failed step leaves the state where it was. Every external command runs
//! with the project root as its explicit working directory.

pub mod templates;

use crate::bail;
use crate::packager::{
    Error, ErrorExt, ErrorKind, Result,
    utils::fs::FileSystem,
    utils::process::{Invocation, OutputLine, ProcessRunner},
    tool_detection::{npm_program, npx_program},
    AppConfig,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use templates::{CAPACITOR_CONFIG, PACKAGE_JSON, RESOURCES_DIR, WEB_DIR};

/// Directory `cap add android` generates; Gradle runs inside it.
pub const ANDROID_DIR: &str = "android";

/// Lifecycle state of a native project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectState {
    Uninitialized,
    Created,
    PlatformAdded,
    Synced,
    Ready,
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectState::Uninitialized => "uninitialized",
            ProjectState::Created => "created",
            ProjectState::PlatformAdded => "platform-added",
            ProjectState::Synced => "synced",
            ProjectState::Ready => "ready",
        })
    }
}

/// Creates and prepares the native project at one root directory.
pub struct ProjectInitializer {
    root: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
    state: ProjectState,
}

impl fmt::Debug for ProjectInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectInitializer")
            .field("root", &self.root)
            .field("state", &self.state)
            .finish()
    }
}

impl ProjectInitializer {
    /// Starts tracking a project that does not exist yet.
    pub fn new(root: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            runner,
            fs,
            state: ProjectState::Uninitialized,
        }
    }

    /// Opens an existing project, inferring its state from disk.
    ///
    /// A project with config files is `Created`; one with an `android/`
    /// tree is `PlatformAdded`. Sync state is never inferred since assets
    /// may have changed since the last sync.
    pub async fn open(root: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        let mut project = Self::new(root, runner, fs);
        let has_config = project.fs.exists(&project.root.join(PACKAGE_JSON)).await
            && project.fs.exists(&project.root.join(CAPACITOR_CONFIG)).await;
        if has_config {
            project.state = if project.fs.exists(&project.android_dir()).await {
                ProjectState::PlatformAdded
            } else {
                ProjectState::Created
            };
        }
        log::debug!("Opened project {} in state {}", project.root.display(), project.state);
        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> ProjectState {
        self.state
    }

    pub fn android_dir(&self) -> PathBuf {
        self.root.join(ANDROID_DIR)
    }

    pub fn web_dir(&self) -> PathBuf {
        self.root.join(WEB_DIR)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.root.join(RESOURCES_DIR)
    }

    /// Creates the project root, its subdirectories and config files.
    ///
    /// Safe to re-run on a `Created` project: directories are created
    /// idempotently and config files are overwritten.
    pub async fn create_project(&mut self, config: &AppConfig) -> Result<()> {
        self.require("create project", ProjectState::Uninitialized, ProjectState::Created)?;
        log::info!("Creating project skeleton at {}", self.root.display());

        for dir in [self.root.clone(), self.web_dir(), self.resources_dir()] {
            self.fs
                .create_dir_all(&dir)
                .await
                .fs_context("creating project directory", &dir)?;
        }

        self.write_json(&self.root.join(PACKAGE_JSON), &templates::package_json(config))
            .await?;
        self.write_json(&self.root.join(CAPACITOR_CONFIG), &templates::capacitor_config(config))
            .await?;

        let index = self.web_dir().join("index.html");
        if !self.fs.exists(&index).await {
            self.fs
                .write(&index, templates::placeholder_index(config).as_bytes())
                .await
                .fs_context("writing placeholder index.html", &index)?;
        }

        self.state = ProjectState::Created;
        Ok(())
    }

    /// Runs `npm install`, then `npm install <plugins...>` when plugins are given.
    pub async fn install_dependencies(&mut self, plugins: &[String]) -> Result<()> {
        self.require("install dependencies", ProjectState::Created, ProjectState::Ready)?;

        let install = Invocation::new(npm_program(), &self.root).args(["install", "--no-audit", "--no-fund"]);
        self.run_step("npm install", install).await?;

        if !plugins.is_empty() {
            log::info!("Installing plugins: {}", plugins.join(", "));
            let install_plugins = Invocation::new(npm_program(), &self.root)
                .args(["install", "--no-audit", "--no-fund"])
                .args(plugins.iter().cloned());
            self.run_step("plugin install", install_plugins).await?;
        }
        Ok(())
    }

    /// Runs `npx cap add android` once.
    ///
    /// Not idempotent: on a project that already has the platform the
    /// Capacitor CLI fails and that failure is returned as is.
    pub async fn add_android_platform(&mut self) -> Result<()> {
        self.require("add android platform", ProjectState::Created, ProjectState::Ready)?;

        let add = Invocation::new(npx_program(), &self.root).args(["cap", "add", "android"]);
        self.run_step("cap add android", add).await?;

        self.state = ProjectState::PlatformAdded;
        Ok(())
    }

    /// Runs `npx cap sync android`, copying `www/` into the native tree.
    ///
    /// Call before every build; web assets may have changed.
    pub async fn sync_project(&mut self) -> Result<()> {
        self.require("sync project", ProjectState::PlatformAdded, ProjectState::Ready)?;

        let sync = Invocation::new(npx_program(), &self.root).args(["cap", "sync", "android"]);
        self.run_step("cap sync android", sync).await?;

        self.state = ProjectState::Synced;
        Ok(())
    }

    /// Confirms the synced project has a native build tree.
    pub async fn mark_ready(&mut self) -> Result<()> {
        self.require("prepare build", ProjectState::Synced, ProjectState::Ready)?;

        let android = self.android_dir();
        if !self.fs.exists(&android).await {
            bail!(
                Build,
                "project not found: native build directory {} is missing",
                android.display()
            );
        }
        self.state = ProjectState::Ready;
        Ok(())
    }

    fn require(&self, action: &str, min: ProjectState, max: ProjectState) -> Result<()> {
        if self.state < min || self.state > max {
            bail!(
                Config,
                "cannot {}: project at {} is {}, expected {}",
                action,
                self.root.display(),
                self.state,
                min
            );
        }
        Ok(())
    }

    async fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()> {
        let mut contents = serde_json::to_vec_pretty(value)
            .map_err(|e| Error::build(format!("serializing {} failed: {}", path.display(), e)))?;
        contents.push(b'\n');
        self.fs
            .write(path, &contents)
            .await
            .fs_context_kind(ErrorKind::Build, "writing project file", path)
    }

    async fn run_step(&self, step: &str, invocation: Invocation) -> Result<()> {
        log::info!("{}: {}", step, invocation);
        let result = self
            .runner
            .run(&invocation, &mut |line: &OutputLine| log::debug!("[{}] {}", step, line.text))
            .await?;

        if !result.success() {
            return Err(Error::build(format!(
                "{} failed with exit code {}",
                step, result.exit_code
            ))
            .with_details(result.error_text()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::testing::{ScriptedResponse, ScriptedRunner};
    use crate::packager::utils::fs::TokioFileSystem;

    fn config(web: &Path) -> AppConfig {
        AppConfig::new("com.example.notes", "Notes", web)
    }

    #[tokio::test]
    async fn create_project_writes_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        let runner = Arc::new(ScriptedRunner::new());
        let mut project = ProjectInitializer::new(&root, runner.clone(), Arc::new(TokioFileSystem));

        project.create_project(&config(dir.path())).await.unwrap();

        assert_eq!(project.state(), ProjectState::Created);
        assert!(root.join("www/index.html").is_file());
        assert!(root.join("resources").is_dir());
        let cap: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(root.join(CAPACITOR_CONFIG)).unwrap()).unwrap();
        assert_eq!(cap["appId"], "com.example.notes");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn install_runs_plugins_as_second_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut project = ProjectInitializer::new(dir.path(), runner.clone(), Arc::new(TokioFileSystem));
        project.create_project(&config(dir.path())).await.unwrap();

        let plugins = vec!["@capacitor/camera".to_string(), "@capacitor/share".to_string()];
        project.install_dependencies(&plugins).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].arguments(), ["install", "--no-audit", "--no-fund"]);
        assert!(calls[1].arguments().ends_with(&plugins));
        assert!(calls.iter().all(|c| c.working_dir() == dir.path()));
    }

    #[tokio::test]
    async fn failed_install_stops_before_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new().on_arg("install", ScriptedResponse::failure(1, "npm ERR! network")),
        );
        let mut project = ProjectInitializer::new(dir.path(), runner.clone(), Arc::new(TokioFileSystem));
        project.create_project(&config(dir.path())).await.unwrap();

        let err = project
            .install_dependencies(&["@capacitor/camera".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Build);
        assert_eq!(err.details(), Some("npm ERR! network"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn second_add_platform_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut project = ProjectInitializer::new(dir.path(), runner.clone(), Arc::new(TokioFileSystem));
        project.create_project(&config(dir.path())).await.unwrap();
        project.add_android_platform().await.unwrap();
        assert_eq!(project.state(), ProjectState::PlatformAdded);

        runner.push_rule_arg(
            "add",
            ScriptedResponse::failure(1, "[error] android platform already exists."),
        );
        let err = project.add_android_platform().await.unwrap_err();
        assert!(err.details().unwrap().contains("already exists"));
        assert_eq!(project.state(), ProjectState::PlatformAdded);
    }

    #[tokio::test]
    async fn steps_out_of_order_spawn_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut project = ProjectInitializer::new(dir.path(), runner.clone(), Arc::new(TokioFileSystem));

        let err = project.sync_project().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(project.add_android_platform().await.is_err());
        assert!(runner.calls().is_empty());
        assert_eq!(project.state(), ProjectState::Uninitialized);
    }

    #[tokio::test]
    async fn failed_sync_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().on_arg("sync", ScriptedResponse::failure(1, "sync exploded")));
        let mut project = ProjectInitializer::new(dir.path(), runner, Arc::new(TokioFileSystem));
        project.create_project(&config(dir.path())).await.unwrap();
        project.add_android_platform().await.unwrap();

        assert!(project.sync_project().await.is_err());
        assert_eq!(project.state(), ProjectState::PlatformAdded);
    }

    #[tokio::test]
    async fn open_infers_platform_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PACKAGE_JSON), "{}").unwrap();
        std::fs::write(dir.path().join(CAPACITOR_CONFIG), "{}").unwrap();
        let runner: Arc<dyn ProcessRunner> = Arc::new(ScriptedRunner::new());

        let project = ProjectInitializer::open(dir.path(), runner.clone(), Arc::new(TokioFileSystem)).await;
        assert_eq!(project.state(), ProjectState::Created);

        std::fs::create_dir_all(dir.path().join(ANDROID_DIR)).unwrap();
        let project = ProjectInitializer::open(dir.path(), runner, Arc::new(TokioFileSystem)).await;
        assert_eq!(project.state(), ProjectState::PlatformAdded);
    }
}
