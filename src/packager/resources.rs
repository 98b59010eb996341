//! Placement of web assets, launcher icons and splash screens.
//!
//! Images are copied as given into every density bucket; Android scales
//! them at runtime. Run after `add_android_platform` and before
//! `sync_project`.

use crate::bail;
use crate::packager::{
    Error, ErrorExt, ErrorKind, Result,
    project::{ANDROID_DIR, templates::WEB_DIR},
    utils::fs::{FileSystem, TokioFileSystem, copy_dir, remove_dir_all},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Density qualifiers Android resolves launcher resources by.
pub const DENSITIES: [&str; 5] = ["mdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi"];

const ICON_FILE: &str = "ic_launcher.png";
const SPLASH_FILE: &str = "splash.png";

/// Places application resources into a project.
///
/// All failures are RESOURCE errors.
#[async_trait]
pub trait ResourceProcessor: Send + Sync {
    /// Copies `icon` into every `mipmap-*` directory. Returns the written paths.
    async fn process_icon(&self, icon: &Path, project: &Path) -> Result<Vec<PathBuf>>;

    /// Copies `splash` into `drawable` and every portrait/landscape density.
    async fn generate_splash_screens(&self, splash: &Path, project: &Path) -> Result<Vec<PathBuf>>;

    /// Replaces the project's `www/` with the contents of `web_dir`.
    async fn copy_web_assets(&self, web_dir: &Path, project: &Path) -> Result<usize>;
}

/// [`ResourceProcessor`] that copies files through a [`FileSystem`].
pub struct FsResourceProcessor {
    fs: Arc<dyn FileSystem>,
}

impl Default for FsResourceProcessor {
    fn default() -> Self {
        Self::new(Arc::new(TokioFileSystem))
    }
}

impl FsResourceProcessor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    async fn place(&self, source: &Path, res_dir: &Path, dirs: &[String], file: &str) -> Result<Vec<PathBuf>> {
        let info = self
            .fs
            .metadata(source)
            .await
            .fs_context_kind(ErrorKind::Resource, "reading image", source)?;
        if !info.is_file || info.len == 0 {
            bail!(Resource, "image {} is not a non-empty file", source.display());
        }
        if source.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() != Some("png") {
            bail!(Resource, "image {} must be a PNG", source.display());
        }

        let mut written = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let target_dir = res_dir.join(dir);
            self.fs
                .create_dir_all(&target_dir)
                .await
                .fs_context_kind(ErrorKind::Resource, "creating resource directory", &target_dir)?;
            let target = target_dir.join(file);
            self.fs
                .copy(source, &target)
                .await
                .fs_context_kind(ErrorKind::Resource, "copying image", &target)?;
            written.push(target);
        }
        Ok(written)
    }
}

/// `android/app/src/main/res` of `project`.
pub fn res_dir(project: &Path) -> PathBuf {
    project.join(ANDROID_DIR).join("app").join("src").join("main").join("res")
}

fn icon_dirs() -> Vec<String> {
    DENSITIES.iter().map(|d| format!("mipmap-{}", d)).collect()
}

fn splash_dirs() -> Vec<String> {
    std::iter::once("drawable".to_string())
        .chain(["port", "land"].iter().flat_map(|orientation| {
            DENSITIES
                .iter()
                .map(move |density| format!("drawable-{}-{}", orientation, density))
        }))
        .collect()
}

#[async_trait]
impl ResourceProcessor for FsResourceProcessor {
    async fn process_icon(&self, icon: &Path, project: &Path) -> Result<Vec<PathBuf>> {
        log::info!("Placing launcher icon {}", icon.display());
        self.place(icon, &res_dir(project), &icon_dirs(), ICON_FILE).await
    }

    async fn generate_splash_screens(&self, splash: &Path, project: &Path) -> Result<Vec<PathBuf>> {
        log::info!("Placing splash screen {}", splash.display());
        self.place(splash, &res_dir(project), &splash_dirs(), SPLASH_FILE).await
    }

    async fn copy_web_assets(&self, web_dir: &Path, project: &Path) -> Result<usize> {
        if !self.fs.exists(&web_dir.join("index.html")).await {
            return Err(Error::resource(format!(
                "web directory {} has no index.html",
                web_dir.display()
            )));
        }

        let target = project.join(WEB_DIR);
        remove_dir_all(&target)
            .await
            .fs_context_kind(ErrorKind::Resource, "clearing web directory", &target)?;
        let copied = copy_dir(web_dir, &target).await?;
        log::info!("Copied {} web files into {}", copied, target.display());
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        path
    }

    #[tokio::test]
    async fn icon_lands_in_every_mipmap() {
        let dir = tempfile::tempdir().unwrap();
        let icon = png(dir.path(), "icon.png");
        let project = dir.path().join("app");

        let written = FsResourceProcessor::default()
            .process_icon(&icon, &project)
            .await
            .unwrap();

        assert_eq!(written.len(), 5);
        assert!(res_dir(&project).join("mipmap-xxxhdpi/ic_launcher.png").is_file());
    }

    #[tokio::test]
    async fn splash_covers_both_orientations() {
        let dir = tempfile::tempdir().unwrap();
        let splash = png(dir.path(), "splash.PNG");
        let project = dir.path().join("app");

        let written = FsResourceProcessor::default()
            .generate_splash_screens(&splash, &project)
            .await
            .unwrap();

        assert_eq!(written.len(), 11);
        assert!(res_dir(&project).join("drawable/splash.png").is_file());
        assert!(res_dir(&project).join("drawable-land-hdpi/splash.png").is_file());
        assert!(res_dir(&project).join("drawable-port-mdpi/splash.png").is_file());
    }

    #[tokio::test]
    async fn missing_or_non_png_image_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let processor = FsResourceProcessor::default();

        let err = processor
            .process_icon(&dir.path().join("missing.png"), dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);

        let jpeg = dir.path().join("icon.jpg");
        std::fs::write(&jpeg, b"jpeg").unwrap();
        let err = processor.process_icon(&jpeg, dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.message().contains("PNG"));
    }

    #[tokio::test]
    async fn web_assets_replace_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let web = dir.path().join("dist");
        std::fs::create_dir_all(web.join("js")).unwrap();
        std::fs::write(web.join("index.html"), "<html></html>").unwrap();
        std::fs::write(web.join("js/app.js"), "run()").unwrap();
        let project = dir.path().join("app");
        std::fs::create_dir_all(project.join("www")).unwrap();
        std::fs::write(project.join("www/stale.js"), "old").unwrap();

        let copied = FsResourceProcessor::default()
            .copy_web_assets(&web, &project)
            .await
            .unwrap();

        assert_eq!(copied, 2);
        assert!(project.join("www/js/app.js").is_file());
        assert!(!project.join("www/stale.js").exists());
    }

    #[tokio::test]
    async fn web_dir_without_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsResourceProcessor::default()
            .copy_web_assets(dir.path(), &dir.path().join("app"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.message().contains("index.html"));
    }
}
