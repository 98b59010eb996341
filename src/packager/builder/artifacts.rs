//! Artifact discovery, validation and relocation.

use crate::packager::{BuildType, Error, ErrorExt, Result, utils::fs::FileSystem};
use chrono::{DateTime, Local};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A validated APK produced by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub path: PathBuf,
    /// Always greater than zero.
    pub size_bytes: u64,
    pub build_type: BuildType,
    /// SHA-256 of the relocated file, when it could be computed.
    pub checksum: Option<String>,
}

/// File name pattern Gradle uses for `build_type` APKs, e.g.
/// `app-debug.apk`, `app-release-unsigned.apk`, `app-prod-release.apk`.
pub fn artifact_pattern(build_type: BuildType) -> Regex {
    Regex::new(&format!(r"^.+-{}(-[A-Za-z0-9]+)*\.apk$", build_type.as_str()))
        .expect("artifact pattern is a valid regex")
}

/// Canonical output name: `app-{buildType}-{timestamp}.apk`.
pub fn canonical_name(build_type: BuildType, at: DateTime<Local>) -> String {
    format!("app-{}-{}.apk", build_type, at.format("%Y%m%d-%H%M%S"))
}

/// Non-recursively scans `scan_dir` and selects the newest matching APK.
pub async fn discover_artifact(
    fs: &dyn FileSystem,
    scan_dir: &Path,
    build_type: BuildType,
) -> Result<PathBuf> {
    let pattern = artifact_pattern(build_type);

    let entries = match fs.read_dir(scan_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err::<PathBuf, _>(e).fs_context("scanning APK output directory", scan_dir),
    };

    let mut candidates: Vec<(PathBuf, SystemTime)> = Vec::new();
    for path in entries {
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pattern.is_match(name));
        if !matches {
            log::trace!("Skipping non-artifact: {}", path.display());
            continue;
        }
        let info = fs
            .metadata(&path)
            .await
            .fs_context("reading artifact metadata", &path)?;
        if info.is_file {
            candidates.push((path, info.modified));
        }
    }

    if candidates.len() > 1 {
        log::info!(
            "Found {} {} APKs in {}, selecting the most recently modified",
            candidates.len(),
            build_type,
            scan_dir.display()
        );
    }

    candidates
        .into_iter()
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
        .ok_or_else(|| {
            Error::build(format!("No APK files found in {}", scan_dir.display())).with_details(
                format!("expected a file matching {} after a successful build", pattern.as_str()),
            )
        })
}

/// Rejects empty artifacts before anything is copied.
pub async fn validate_artifact(
    fs: &dyn FileSystem,
    path: &Path,
    build_type: BuildType,
) -> Result<BuildArtifact> {
    let info = fs
        .metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;

    if info.len == 0 {
        return Err(Error::build(format!("APK file is empty: {}", path.display()))
            .with_details("the toolchain reported success but wrote a zero-byte APK"));
    }

    Ok(BuildArtifact {
        path: path.to_path_buf(),
        size_bytes: info.len,
        build_type,
        checksum: None,
    })
}

/// Copies the artifact into `output_dir` under its canonical name.
///
/// Overwrites a same-named file, so re-running after a failure is safe.
pub async fn relocate_artifact(
    fs: &dyn FileSystem,
    artifact: &BuildArtifact,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs.create_dir_all(output_dir)
        .await
        .fs_context("creating output directory", output_dir)?;

    let destination = output_dir.join(canonical_name(artifact.build_type, Local::now()));
    fs.copy(&artifact.path, &destination).await.map_err(|e| {
        Error::build(format!("copying APK failed: {}", e))
            .with_details(format!(
                "source: {}\ndestination: {}",
                artifact.path.display(),
                destination.display()
            ))
            .with_source(e)
    })?;

    log::info!("Copied {} -> {}", artifact.path.display(), destination.display());
    Ok(destination)
}
