//! Application metadata.

use crate::bail;
use crate::packager::Result;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Reverse-domain Android application id, e.g. `com.example.app`.
static APP_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*(\.[a-zA-Z][a-zA-Z0-9_]*)+$").expect("valid app id regex")
});

/// Application being packaged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AppConfig {
    /// Android application id (`applicationId` / Capacitor `appId`).
    pub app_id: String,
    /// Display name.
    pub app_name: String,
    #[serde(default = "default_version_name")]
    pub version_name: String,
    #[serde(default = "default_version_code")]
    pub version_code: u32,
    /// Directory holding the static web bundle (must contain `index.html`).
    pub web_dir: PathBuf,
    #[serde(default)]
    pub icon: Option<PathBuf>,
    #[serde(default)]
    pub splash: Option<PathBuf>,
    /// Extra npm packages (Capacitor plugins) to install.
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

fn default_version_name() -> String {
    "1.0.0".to_string()
}

fn default_version_code() -> u32 {
    1
}

impl AppConfig {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>, web_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            version_name: default_version_name(),
            version_code: default_version_code(),
            web_dir: web_dir.into(),
            icon: None,
            splash: None,
            plugins: Vec::new(),
            background_color: None,
        }
    }

    /// npm package name derived from the app name (`My App!` -> `my-app`).
    pub fn package_name(&self) -> String {
        let mut name = String::with_capacity(self.app_name.len());
        for c in self.app_name.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c.to_ascii_lowercase());
            } else if !name.ends_with('-') {
                name.push('-');
            }
        }
        let name = name.trim_matches('-');
        if name.is_empty() {
            "app".to_string()
        } else {
            name.to_string()
        }
    }

    /// Checks the fields that the native toolchain would otherwise reject late.
    pub fn validate(&self) -> Result<()> {
        if !APP_ID.is_match(&self.app_id) {
            bail!(
                Config,
                "invalid app_id '{}': expected reverse-domain form like com.example.app",
                self.app_id
            );
        }
        if self.app_name.trim().is_empty() {
            bail!(Config, "app_name must not be empty");
        }
        if self.version_code == 0 {
            bail!(Config, "version_code must be greater than 0");
        }
        if !self.web_dir.is_dir() {
            bail!(
                Config,
                "web_dir {} does not exist or is not a directory",
                self.web_dir.display()
            );
        }
        Ok(())
    }
}
