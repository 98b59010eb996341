//! In-place APK signing and verification.

use super::keystore::{debug_keystore_config, default_debug_keystore_path};
use super::verify::signature_verified;
use crate::bail;
use crate::packager::{
    Error, ErrorKind, KeystoreConfig, Result,
    tool_detection::apksigner_program,
    utils::fs::{FileSystem, TokioFileSystem, remove_file_if_exists},
    utils::process::{Invocation, OutputLine, ProcessRunner, TokioProcessRunner},
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Signs and verifies APKs through `apksigner`.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_apk::packager::{ArtifactSigner, KeystoreConfig};
///
/// # async fn example() -> kodegen_bundler_apk::packager::Result<()> {
/// let signer = ArtifactSigner::new();
/// let keystore = KeystoreConfig::new("release.jks", "secret", "upload", "");
/// let signed = signer.sign_apk("dist/app-release-20250101-120000.apk".as_ref(), &keystore).await?;
/// assert!(signer.verify_apk_signature(&signed).await?);
/// # Ok(())
/// # }
/// ```
pub struct ArtifactSigner {
    pub(super) runner: Arc<dyn ProcessRunner>,
    pub(super) fs: Arc<dyn FileSystem>,
    debug_keystore: Option<PathBuf>,
}

impl fmt::Debug for ArtifactSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactSigner")
            .field("debug_keystore", &self.debug_keystore)
            .finish_non_exhaustive()
    }
}

impl Default for ArtifactSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactSigner {
    pub fn new() -> Self {
        Self::with_capabilities(Arc::new(TokioProcessRunner), Arc::new(TokioFileSystem))
    }

    pub fn with_capabilities(runner: Arc<dyn ProcessRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            runner,
            fs,
            debug_keystore: None,
        }
    }

    /// Uses `path` instead of `~/.android/debug.keystore` for debug signing.
    pub fn debug_keystore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_keystore = Some(path.into());
        self
    }

    /// Signs `apk` in place and returns its path.
    ///
    /// The signed output is written to a temporary sibling, verified, then
    /// renamed over `apk`. On any failure the temporary file is removed and
    /// `apk` is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Always a SIGNING error: missing APK, invalid keystore configuration,
    /// `apksigner` failure, failed verification or a failed rename.
    pub async fn sign_apk(&self, apk: &Path, keystore: &KeystoreConfig) -> Result<PathBuf> {
        if !self.fs.exists(apk).await {
            bail!(Signing, "APK not found: {}", apk.display());
        }

        let problems = self.keystore_problems(keystore).await?;
        if !problems.is_empty() {
            return Err(Error::signing(format!(
                "invalid keystore configuration for {}",
                keystore.path().display()
            ))
            .with_details(problems.join("\n")));
        }

        let temp = temp_path(apk);
        log::info!("Signing {} with key '{}'", apk.display(), keystore.alias);

        match self.sign_via(apk, keystore, &temp).await {
            Ok(()) => {
                log::info!("✓ Signed {}", apk.display());
                Ok(apk.to_path_buf())
            }
            Err(e) => {
                if let Err(cleanup) = remove_file_if_exists(self.fs.as_ref(), &temp).await {
                    log::warn!("Could not remove {}: {}", temp.display(), cleanup);
                }
                Err(e.into_kind(ErrorKind::Signing))
            }
        }
    }

    async fn sign_via(&self, apk: &Path, keystore: &KeystoreConfig, temp: &Path) -> Result<()> {
        let invocation = sign_invocation(apk, keystore, temp);
        log::debug!("Running `{}`", invocation);

        let result = self
            .runner
            .run(&invocation, &mut |line: &OutputLine| log::debug!("[apksigner] {}", line.text))
            .await?;
        if !result.success() {
            return Err(Error::signing(format!(
                "apksigner sign failed with exit code {}",
                result.exit_code
            ))
            .with_details(result.error_text()));
        }

        if !self.verify_apk_signature(temp).await? {
            return Err(Error::signing(format!(
                "signature verification failed for {}",
                apk.display()
            )));
        }

        self.fs.rename(temp, apk).await.map_err(|e| {
            Error::signing(format!("replacing APK with signed output failed: {}", e))
                .with_details(format!("source: {}\ndestination: {}", temp.display(), apk.display()))
                .with_source(e)
        })
    }

    /// Ensures the debug keystore exists, then signs `apk` with it.
    pub async fn sign_apk_with_debug_keystore(&self, apk: &Path) -> Result<PathBuf> {
        let path = match &self.debug_keystore {
            Some(path) => path.clone(),
            None => default_debug_keystore_path()?,
        };
        self.generate_debug_keystore(&path).await?;
        self.sign_apk(apk, &debug_keystore_config(path)).await
    }

    /// Runs `apksigner verify --verbose` on `apk`.
    ///
    /// `Ok(false)` means the tool ran and rejected the signature.
    pub async fn verify_apk_signature(&self, apk: &Path) -> Result<bool> {
        let invocation = Invocation::new(apksigner_program(), working_dir(apk)).args([
            "verify".to_string(),
            "--verbose".to_string(),
            apk.display().to_string(),
        ]);

        let result = self
            .runner
            .run(&invocation, &mut |line: &OutputLine| log::trace!("[apksigner] {}", line.text))
            .await
            .map_err(|e| e.into_kind(ErrorKind::Signing))?;

        let verified = signature_verified(&result);
        log::debug!("{} signature verified: {}", apk.display(), verified);
        Ok(verified)
    }
}

fn working_dir(apk: &Path) -> &Path {
    apk.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Hidden sibling of `apk` receiving the signed output.
fn temp_path(apk: &Path) -> PathBuf {
    let name = apk
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app.apk".to_string());
    apk.with_file_name(format!(".{}.{}.signing", name, uuid::Uuid::new_v4().simple()))
}

fn sign_invocation(apk: &Path, keystore: &KeystoreConfig, out: &Path) -> Invocation {
    Invocation::new(apksigner_program(), working_dir(apk)).args([
        "sign".to_string(),
        "--ks".to_string(),
        keystore.path().display().to_string(),
        "--ks-key-alias".to_string(),
        keystore.alias.clone(),
        "--ks-pass".to_string(),
        format!("pass:{}", keystore.password),
        "--key-pass".to_string(),
        format!("pass:{}", keystore.key_password()),
        "--out".to_string(),
        out.display().to_string(),
        apk.display().to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::testing::{RecordingFileSystem, ScriptedResponse, ScriptedRunner};

    struct Fixture {
        dir: tempfile::TempDir,
        apk: PathBuf,
        keystore: KeystoreConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("app-release-20250101-120000.apk");
        std::fs::write(&apk, b"unsigned").unwrap();
        let ks = dir.path().join("release.jks");
        std::fs::write(&ks, b"keystore").unwrap();
        Fixture {
            keystore: KeystoreConfig::new(ks, "store-pw", "upload", ""),
            dir,
            apk,
        }
    }

    fn value_after<'a>(inv: &'a Invocation, flag: &str) -> &'a str {
        let args = inv.arguments();
        let at = args.iter().position(|a| a == flag).unwrap();
        &args[at + 1]
    }

    /// `apksigner sign` that writes `signed` to its `--out` path.
    fn writes_signed() -> ScriptedResponse {
        ScriptedResponse::success().with_effect(|inv| {
            std::fs::write(value_after(inv, "--out"), b"signed").unwrap();
        })
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".signing"))
            .collect()
    }

    #[tokio::test]
    async fn signs_in_place_after_verification() {
        let f = fixture();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_arg("sign", writes_signed())
                .on_arg(
                    "verify",
                    ScriptedResponse::success().stdout("Verified using v2 scheme (APK Signature Scheme v2): true"),
                ),
        );
        let signer = ArtifactSigner::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

        let signed = signer.sign_apk(&f.apk, &f.keystore).await.unwrap();

        assert_eq!(signed, f.apk);
        assert_eq!(std::fs::read(&f.apk).unwrap(), b"signed");
        assert!(leftovers(f.dir.path()).is_empty());

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(value_after(&calls[0], "--ks-pass"), "pass:store-pw");
        assert_eq!(value_after(&calls[0], "--key-pass"), "pass:store-pw");
        assert_eq!(value_after(&calls[0], "--ks-key-alias"), "upload");
        // verification runs against the temporary output, not the original
        assert_eq!(calls[1].arguments().last().unwrap(), value_after(&calls[0], "--out"));
        assert!(!calls[0].to_string().contains("store-pw"));
    }

    #[tokio::test]
    async fn explicit_key_password_is_used() {
        let mut f = fixture();
        f.keystore.alias_password = "key-pw".to_string();
        let runner = Arc::new(ScriptedRunner::new().on_arg("sign", writes_signed()));
        let signer = ArtifactSigner::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

        signer.sign_apk(&f.apk, &f.keystore).await.unwrap();
        assert_eq!(value_after(&runner.calls()[0], "--key-pass"), "pass:key-pw");
    }

    #[tokio::test]
    async fn failed_verification_keeps_original_and_cleans_up() {
        let f = fixture();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_arg("sign", writes_signed())
                .on_arg("verify", ScriptedResponse::success().stdout("DOES NOT VERIFY")),
        );
        let fs = Arc::new(RecordingFileSystem::new());
        let signer = ArtifactSigner::with_capabilities(runner, fs.clone());

        let err = signer.sign_apk(&f.apk, &f.keystore).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Signing);
        assert_eq!(std::fs::read(&f.apk).unwrap(), b"unsigned");
        assert!(leftovers(f.dir.path()).is_empty());
        assert_eq!(fs.count("rename"), 0);
        assert_eq!(fs.count("remove_file"), 1);
    }

    #[tokio::test]
    async fn apksigner_failure_removes_partial_output() {
        let f = fixture();
        let runner = Arc::new(ScriptedRunner::new().on_arg(
            "sign",
            ScriptedResponse::failure(2, "Failed to load signer \"signer #1\"").with_effect(|inv| {
                std::fs::write(value_after(inv, "--out"), b"half").unwrap();
            }),
        ));
        let signer = ArtifactSigner::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

        let err = signer.sign_apk(&f.apk, &f.keystore).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(err.message().contains("exit code 2"));
        assert!(err.details().unwrap().contains("Failed to load signer"));
        assert!(leftovers(f.dir.path()).is_empty());
        assert_eq!(std::fs::read(&f.apk).unwrap(), b"unsigned");
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn invalid_keystore_spawns_nothing() {
        let f = fixture();
        let runner = Arc::new(ScriptedRunner::new());
        let signer = ArtifactSigner::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));
        let keystore = KeystoreConfig::new(f.dir.path().join("missing.jks"), "pw", "alias", "");

        let err = signer.sign_apk(&f.apk, &keystore).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(err.message().contains("keystore"));
        assert!(err.details().unwrap().contains("not found"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_apk_is_signing_error() {
        let f = fixture();
        let signer = ArtifactSigner::with_capabilities(Arc::new(ScriptedRunner::new()), Arc::new(TokioFileSystem));

        let err = signer
            .sign_apk(&f.dir.path().join("absent.apk"), &f.keystore)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(err.message().contains("APK not found"));
    }

    #[tokio::test]
    async fn debug_signing_generates_keystore_once() {
        let f = fixture();
        let debug_ks = f.dir.path().join("debug.keystore");
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_arg(
                    "-genkeypair",
                    ScriptedResponse::success().with_effect(|inv| {
                        std::fs::write(value_after(inv, "-keystore"), b"debug").unwrap();
                    }),
                )
                .on_arg("sign", writes_signed()),
        );
        let signer =
            ArtifactSigner::with_capabilities(runner.clone(), Arc::new(TokioFileSystem)).debug_keystore_path(&debug_ks);

        signer.sign_apk_with_debug_keystore(&f.apk).await.unwrap();
        signer.sign_apk_with_debug_keystore(&f.apk).await.unwrap();

        let genkey = runner
            .calls()
            .iter()
            .filter(|c| c.arguments().iter().any(|a| a == "-genkeypair"))
            .count();
        assert_eq!(genkey, 1);
        let sign = runner.calls().into_iter().find(|c| c.arguments()[0] == "sign").unwrap();
        assert_eq!(value_after(&sign, "--ks-key-alias"), "androiddebugkey");
        assert_eq!(value_after(&sign, "--key-pass"), "pass:android");
    }
}
