//! APK signing with `keytool` and `apksigner`.
//!
//! [`ArtifactSigner`] owns the keystore lifecycle: it validates keystore
//! configurations, creates the shared debug keystore on first use, signs
//! APKs in place and verifies the result. No cryptography happens in this
//! crate; both tools come from the JDK and the Android SDK build-tools.
//!
//! Signing never leaves a partially written APK behind. The signed output
//! goes to a temporary sibling file that only replaces the original once
//! `apksigner verify` accepts it.

mod keystore;
mod signer;
mod verify;

pub use keystore::{
    DEBUG_KEY_ALIAS, DEBUG_KEYSTORE_DNAME, DEBUG_KEYSTORE_PASSWORD, DEBUG_KEYSTORE_VALIDITY_DAYS,
    debug_keystore_config, default_debug_keystore_path,
};
pub use signer::ArtifactSigner;
pub use verify::signature_verified;
