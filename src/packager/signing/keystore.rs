//! Keystore validation and debug keystore generation.

use super::ArtifactSigner;
use crate::packager::{
    Error, ErrorExt, ErrorKind, KeystoreConfig, Result,
    tool_detection::keytool_program,
    utils::process::{Invocation, OutputLine},
};
use std::io;
use std::path::{Path, PathBuf};

/// Alias of the key inside the debug keystore.
pub const DEBUG_KEY_ALIAS: &str = "androiddebugkey";

/// Store and key password of the debug keystore.
pub const DEBUG_KEYSTORE_PASSWORD: &str = "android";

/// Distinguished name Android tooling uses for debug certificates.
pub const DEBUG_KEYSTORE_DNAME: &str = "CN=Android Debug,O=Android,C=US";

pub const DEBUG_KEYSTORE_VALIDITY_DAYS: u32 = 10000;

/// `~/.android/debug.keystore`, shared with Android Studio.
pub fn default_debug_keystore_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".android").join("debug.keystore"))
        .ok_or_else(|| Error::signing("cannot locate the home directory for the debug keystore"))
}

/// Fixed credentials of the debug keystore at `path`.
pub fn debug_keystore_config(path: impl Into<PathBuf>) -> KeystoreConfig {
    KeystoreConfig::new(path, DEBUG_KEYSTORE_PASSWORD, DEBUG_KEY_ALIAS, DEBUG_KEYSTORE_PASSWORD)
}

impl ArtifactSigner {
    /// Checks that the keystore file exists and the credentials are filled in.
    ///
    /// Returns `Ok(false)` for a configuration that is merely incomplete.
    /// Only an unreadable keystore (for example a permission error while
    /// reading its metadata) is an error.
    pub async fn validate_keystore_config(&self, config: &KeystoreConfig) -> Result<bool> {
        let problems = self.keystore_problems(config).await?;
        for problem in &problems {
            log::debug!("keystore configuration: {}", problem);
        }
        Ok(problems.is_empty())
    }

    pub(super) async fn keystore_problems(&self, config: &KeystoreConfig) -> Result<Vec<String>> {
        let mut problems = Vec::new();

        match self.fs.metadata(config.path()).await {
            Ok(info) if info.is_file => {}
            Ok(_) => problems.push(format!("keystore {} is not a file", config.path().display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                problems.push(format!("keystore file not found: {}", config.path().display()))
            }
            Err(e) => {
                return Err::<Vec<String>, _>(e).fs_context_kind(
                    ErrorKind::Signing,
                    "reading keystore",
                    config.path(),
                );
            }
        }
        if config.password.is_empty() {
            problems.push("keystore password is empty".to_string());
        }
        if config.alias.is_empty() {
            problems.push("keystore alias is empty".to_string());
        }
        Ok(problems)
    }

    /// Creates a debug keystore at `path` unless a file is already there.
    pub async fn generate_debug_keystore(&self, path: &Path) -> Result<()> {
        if self.fs.exists(path).await {
            log::debug!("Debug keystore already exists: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs
                .create_dir_all(parent)
                .await
                .fs_context_kind(ErrorKind::Signing, "creating keystore directory", parent)?;
        }

        log::info!("Generating debug keystore at {}", path.display());
        let cwd = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let validity = DEBUG_KEYSTORE_VALIDITY_DAYS.to_string();
        let keystore = path.display().to_string();
        let invocation = Invocation::new(keytool_program(), cwd).args([
            "-genkeypair",
            "-v",
            "-keystore",
            keystore.as_str(),
            "-storepass",
            DEBUG_KEYSTORE_PASSWORD,
            "-alias",
            DEBUG_KEY_ALIAS,
            "-keypass",
            DEBUG_KEYSTORE_PASSWORD,
            "-keyalg",
            "RSA",
            "-keysize",
            "2048",
            "-validity",
            validity.as_str(),
            "-dname",
            DEBUG_KEYSTORE_DNAME,
        ]);

        let result = self
            .runner
            .run(&invocation, &mut |line: &OutputLine| log::debug!("[keytool] {}", line.text))
            .await
            .map_err(|e| e.into_kind(ErrorKind::Signing))?;

        if !result.success() {
            return Err(Error::signing(format!(
                "keytool failed to generate the debug keystore (exit code {})",
                result.exit_code
            ))
            .with_details(result.error_text()));
        }
        Ok(())
    }
}
