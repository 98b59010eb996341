//! External tool resolution and availability checking.
//!
//! Resolves the executables the pipeline drives: npm/npx for the project
//! skeleton, keytool and apksigner for signing. Lookups are cached because
//! each one may scan the Android SDK directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `npm` executable name for this platform.
pub fn npm_program() -> &'static str {
    if cfg!(windows) { "npm.cmd" } else { "npm" }
}

/// `npx` executable name for this platform.
pub fn npx_program() -> &'static str {
    if cfg!(windows) { "npx.cmd" } else { "npx" }
}

/// File name of the Gradle wrapper generated by `cap add android` in `android/`.
pub fn gradle_wrapper() -> &'static str {
    if cfg!(windows) { "gradlew.bat" } else { "gradlew" }
}

/// Resolved `apksigner`: PATH first, then the newest SDK build-tools.
pub static APKSIGNER: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let name = if cfg!(windows) { "apksigner.bat" } else { "apksigner" };
    if let Ok(path) = which::which(name) {
        log::debug!("Found apksigner at: {}", path.display());
        return Some(path);
    }

    let found = android_sdk_root().and_then(|sdk| newest_build_tool(&sdk.join("build-tools"), name));
    match &found {
        Some(path) => log::debug!("Found apksigner in SDK build-tools: {}", path.display()),
        None => log::debug!("apksigner not found in PATH or ANDROID_HOME/build-tools"),
    }
    found
});

/// Resolved `keytool`: PATH first, then `$JAVA_HOME/bin`.
pub static KEYTOOL: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let name = if cfg!(windows) { "keytool.exe" } else { "keytool" };
    if let Ok(path) = which::which(name) {
        log::debug!("Found keytool at: {}", path.display());
        return Some(path);
    }

    let candidate = std::env::var_os("JAVA_HOME").map(|home| PathBuf::from(home).join("bin").join(name));
    match candidate {
        Some(path) if path.is_file() => {
            log::debug!("Found keytool in JAVA_HOME: {}", path.display());
            Some(path)
        }
        _ => {
            log::debug!("keytool not found in PATH or JAVA_HOME");
            None
        }
    }
});

/// `apksigner` to invoke, falling back to the bare name so the spawn error
/// reports what was missing.
pub fn apksigner_program() -> String {
    APKSIGNER
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "apksigner".to_string())
}

/// `keytool` to invoke; see [`apksigner_program`].
pub fn keytool_program() -> String {
    KEYTOOL
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "keytool".to_string())
}

fn android_sdk_root() -> Option<PathBuf> {
    ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .iter()
        .filter_map(|key| std::env::var_os(key))
        .map(PathBuf::from)
        .find(|p| p.is_dir())
}

/// Picks `name` from the numerically newest build-tools version.
fn newest_build_tool(build_tools: &Path, name: &str) -> Option<PathBuf> {
    std::fs::read_dir(build_tools)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.join(name).is_file())
        .max_by_key(|p| version_key(p))
        .map(|dir| dir.join(name))
}

/// `34.0.0` -> `[34, 0, 0]`; non-numeric separators are skipped.
fn version_key(dir: &Path) -> Vec<u64> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Availability of one external tool, for `doctor` output.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
    pub purpose: &'static str,
}

/// Checks every tool the pipeline may invoke.
pub fn detect_tools() -> Vec<ToolStatus> {
    vec![
        ToolStatus {
            name: "npm",
            path: which::which(npm_program()).ok(),
            purpose: "installing project dependencies",
        },
        ToolStatus {
            name: "npx",
            path: which::which(npx_program()).ok(),
            purpose: "running the Capacitor CLI",
        },
        ToolStatus {
            name: "java",
            path: which::which("java").ok(),
            purpose: "running Gradle",
        },
        ToolStatus {
            name: "keytool",
            path: KEYTOOL.clone(),
            purpose: "generating the debug keystore",
        },
        ToolStatus {
            name: "apksigner",
            path: APKSIGNER.clone(),
            purpose: "signing and verifying APKs",
        },
    ]
}
