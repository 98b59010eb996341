//! Interpretation of `apksigner verify --verbose` output.

use crate::packager::utils::process::ProcessResult;
use regex::Regex;
use std::sync::LazyLock;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Verified using v\d+(\.\d+)? scheme.*: (true|false)\s*$").expect("valid scheme regex"));

/// Whether `apksigner verify` accepted the APK.
///
/// Requires exit code 0 and no `DOES NOT VERIFY` line. When the tool reports
/// per-scheme results, at least one scheme must be `true`; older build-tools
/// print only `Verifies`, which counts as accepted.
pub fn signature_verified(result: &ProcessResult) -> bool {
    if !result.success() {
        return false;
    }

    let lines = || result.stdout_lines.iter().chain(result.stderr_lines.iter()).map(|l| l.trim());
    if lines().any(|l| l.contains("DOES NOT VERIFY")) {
        return false;
    }

    let mut schemes = lines().filter_map(|l| SCHEME.captures(l).map(|c| &c[2] == "true")).peekable();
    if schemes.peek().is_none() {
        return true;
    }
    schemes.any(|verified| verified)
}
