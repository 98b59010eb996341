//! Builder for constructing BuildOptions.

use super::{BuildOptions, BuildTool, KeystoreConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default hard limit for a single external build.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Builder for constructing [`BuildOptions`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_apk::packager::{BuildOptionsBuilder, KeystoreConfig};
///
/// # fn example() -> kodegen_bundler_apk::packager::Result<()> {
/// let options = BuildOptionsBuilder::new()
///     .output_dir("dist")
///     .release(true)
///     .minify_web(true)
///     .keystore(KeystoreConfig::new("release.jks", "secret", "upload", ""))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct BuildOptionsBuilder {
    release: bool,
    output_dir: Option<PathBuf>,
    minify_web: bool,
    keystore: Option<KeystoreConfig>,
    build_tool: BuildTool,
    timeout: Option<Option<Duration>>,
}

impl BuildOptionsBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the directory the final APK is copied into.
    ///
    /// Default: `dist`
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Passes `-PminifyEnabled=true` to release builds.
    pub fn minify_web(mut self, minify: bool) -> Self {
        self.minify_web = minify;
        self
    }

    pub fn keystore(mut self, keystore: KeystoreConfig) -> Self {
        self.keystore = Some(keystore);
        self
    }

    pub fn maybe_keystore(mut self, keystore: Option<KeystoreConfig>) -> Self {
        self.keystore = keystore;
        self
    }

    /// Default: [`BuildTool::Gradle`]
    pub fn build_tool(mut self, tool: BuildTool) -> Self {
        self.build_tool = tool;
        self
    }

    /// Hard limit for the external build. `None` disables the limit.
    ///
    /// Default: [`DEFAULT_BUILD_TIMEOUT`]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds and validates the options.
    ///
    /// # Errors
    ///
    /// CONFIG error when `release` is set without a keystore.
    pub fn build(self) -> crate::packager::Result<BuildOptions> {
        let options = BuildOptions {
            release: self.release,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("dist")),
            minify_web: self.minify_web,
            keystore: self.keystore,
            build_tool: self.build_tool,
            timeout: self.timeout.unwrap_or(Some(DEFAULT_BUILD_TIMEOUT)),
        };
        options.validate()?;
        Ok(options)
    }
}
