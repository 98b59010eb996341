//! `sign`: sign an APK in place.

use crate::cli::{RuntimeConfig, SignArgs};
use crate::error::{CliError, Result};
use crate::packager::ArtifactSigner;

pub async fn execute(args: &SignArgs, runtime_config: &RuntimeConfig) -> Result<i32> {
    let signer = ArtifactSigner::new();

    let signed = if args.debug {
        runtime_config.progress(&format!("Signing {} with the debug keystore", args.apk.display()))?;
        signer.sign_apk_with_debug_keystore(&args.apk).await?
    } else {
        let keystore = args.keystore.to_config()?.ok_or_else(|| CliError::MissingArgument {
            argument: "--keystore (or --debug)".to_string(),
        })?;
        runtime_config.progress(&format!(
            "Signing {} with {}",
            args.apk.display(),
            keystore.path().display()
        ))?;
        signer.sign_apk(&args.apk, &keystore).await?
    };

    runtime_config.success(&format!("Signed {}", signed.display()))?;
    runtime_config.output().println(&signed.display().to_string())?;
    Ok(0)
}
