//! Build options and signing credentials.

use crate::packager::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Gradle build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External toolchain front-end that performs the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    /// `gradlew assemble*` in the project's `android/` directory.
    #[default]
    Gradle,
    /// `npx cap build android` in the project root.
    Capacitor,
}

impl FromStr for BuildTool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gradle" => Ok(BuildTool::Gradle),
            "capacitor" | "cap" => Ok(BuildTool::Capacitor),
            other => Err(Error::config(format!(
                "unknown build tool '{}': expected gradle or capacitor",
                other
            ))),
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildTool::Gradle => "gradle",
            BuildTool::Capacitor => "capacitor",
        })
    }
}

/// Keystore used to sign release builds.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct KeystoreConfig {
    pub path: PathBuf,
    pub password: String,
    pub alias: String,
    /// Key password; empty means "same as `password`".
    #[serde(default)]
    pub alias_password: String,
}

impl KeystoreConfig {
    pub fn new(
        path: impl Into<PathBuf>,
        password: impl Into<String>,
        alias: impl Into<String>,
        alias_password: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            password: password.into(),
            alias: alias.into(),
            alias_password: alias_password.into(),
        }
    }

    /// Password for the key entry, falling back to the keystore password.
    pub fn key_password(&self) -> &str {
        if self.alias_password.is_empty() {
            &self.password
        } else {
            &self.alias_password
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("path", &self.path)
            .field("password", &"****")
            .field("alias", &self.alias)
            .field("alias_password", &"****")
            .finish()
    }
}

/// Options for one `build_apk` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub release: bool,
    pub output_dir: PathBuf,
    pub minify_web: bool,
    pub keystore: Option<KeystoreConfig>,
    pub build_tool: BuildTool,
    /// Hard limit for the external build; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl BuildOptions {
    pub fn build_type(&self) -> BuildType {
        if self.release {
            BuildType::Release
        } else {
            BuildType::Debug
        }
    }

    /// Fails fast on option combinations the pipeline can never satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.release && self.keystore.is_none() {
            return Err(Error::config(
                "release builds require a keystore (set [keystore] in apk.toml or pass --keystore)",
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output directory must not be empty"));
        }
        Ok(())
    }
}
