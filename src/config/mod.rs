//! `apk.toml` loading.
//!
//! ```toml
//! [app]
//! app_id = "com.example.todo"
//! app_name = "Todo"
//! web_dir = "dist"
//! icon = "assets/icon.png"
//! plugins = ["@capacitor/share"]
//!
//! [build]
//! release = true
//! output_dir = "out"
//! tool = "gradle"
//! timeout_secs = 1800
//!
//! [keystore]
//! path = "release.jks"
//! alias = "upload"
//! # password from APK_KEYSTORE_PASSWORD, key password from APK_KEY_PASSWORD
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::packager::{
    AppConfig, BuildOptions, BuildOptionsBuilder, BuildTool, Error, ErrorExt, ErrorKind,
    KeystoreConfig, Result,
};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file name looked up in the project directory.
pub const CONFIG_FILE: &str = "apk.toml";

pub const KEYSTORE_PASSWORD_ENV: &str = "APK_KEYSTORE_PASSWORD";
pub const KEY_PASSWORD_ENV: &str = "APK_KEY_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    app: AppConfig,
    #[serde(default)]
    build: BuildSection,
    #[serde(default)]
    keystore: Option<KeystoreSection>,
}

/// `[build]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default)]
    pub release: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub minify_web: bool,
    #[serde(default)]
    pub tool: BuildTool,
    /// `0` disables the timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `[keystore]` table; passwords may come from the environment instead.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeystoreSection {
    pub path: PathBuf,
    #[serde(default)]
    pub password: Option<String>,
    pub alias: String,
    #[serde(default)]
    pub alias_password: Option<String>,
}

impl std::fmt::Debug for KeystoreSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreSection")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub release: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub minify_web: Option<bool>,
    pub tool: Option<BuildTool>,
    pub timeout_secs: Option<u64>,
    pub keystore: Option<KeystoreConfig>,
}

/// Parsed and path-resolved `apk.toml`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    app: AppConfig,
    build: BuildSection,
    keystore: Option<KeystoreSection>,
}

impl ConfigManager {
    /// Reads `path` and resolves relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).fs_context_kind(ErrorKind::Config, "reading config", path)?;
        Self::parse(&contents, path)
    }

    /// Loads `<dir>/apk.toml`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    /// Parses `contents` as if read from `path`.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| {
            Error::config(format!("invalid {}: {}", path.display(), e.message()))
                .with_details(e.to_string())
        })?;

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut app = file.app;
        app.web_dir = resolve(base, &app.web_dir)?;
        app.icon = app.icon.as_deref().map(|p| resolve(base, p)).transpose()?;
        app.splash = app.splash.as_deref().map(|p| resolve(base, p)).transpose()?;

        let mut build = file.build;
        build.output_dir = build.output_dir.as_deref().map(|p| resolve(base, p)).transpose()?;

        let mut keystore = file.keystore;
        if let Some(ks) = keystore.as_mut() {
            ks.path = resolve(base, &ks.path)?;
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            app,
            build,
            keystore,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app
    }

    pub fn build_section(&self) -> &BuildSection {
        &self.build
    }

    /// Keystore from the file, with passwords filled from the environment.
    pub fn keystore(&self) -> Result<Option<KeystoreConfig>> {
        self.keystore_with_env(|key| std::env::var(key).ok())
    }

    fn keystore_with_env(&self, env: impl Fn(&str) -> Option<String>) -> Result<Option<KeystoreConfig>> {
        let Some(section) = &self.keystore else {
            return Ok(None);
        };
        let password = section
            .password
            .clone()
            .or_else(|| env(KEYSTORE_PASSWORD_ENV))
            .ok_or_else(|| {
                Error::config(format!(
                    "keystore password missing: set [keystore].password or {}",
                    KEYSTORE_PASSWORD_ENV
                ))
            })?;
        let alias_password = section
            .alias_password
            .clone()
            .or_else(|| env(KEY_PASSWORD_ENV))
            .unwrap_or_default();

        Ok(Some(KeystoreConfig::new(
            &section.path,
            password,
            &section.alias,
            alias_password,
        )))
    }

    /// Merges the `[build]` table with `overrides` into validated options.
    pub fn build_options(&self, overrides: BuildOverrides) -> Result<BuildOptions> {
        let keystore = match overrides.keystore {
            Some(keystore) => Some(keystore),
            None => self.keystore()?,
        };
        let timeout_secs = overrides.timeout_secs.or(self.build.timeout_secs);

        let mut builder = BuildOptionsBuilder::new()
            .release(overrides.release.unwrap_or(self.build.release))
            .minify_web(overrides.minify_web.unwrap_or(self.build.minify_web))
            .build_tool(overrides.tool.unwrap_or(self.build.tool))
            .maybe_keystore(keystore);
        if let Some(dir) = overrides.output_dir.or_else(|| self.build.output_dir.clone()) {
            builder = builder.output_dir(dir);
        }
        if let Some(secs) = timeout_secs {
            builder = builder.timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        builder.build()
    }
}

fn resolve(base: &Path, path: &Path) -> Result<PathBuf> {
    path.absolutize_from(base)
        .map(|p| p.into_owned())
        .fs_context_kind(ErrorKind::Config, "resolving path", path)
}
