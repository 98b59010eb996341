//! Kodegen Bundler APK - Android packager for static web bundles.
//!
//! This binary turns a web build output directory into an Android APK,
//! signing release builds, with actionable error messages.

use kodegen_bundler_apk::cli::{self, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            let output = OutputManager::new(false, false);
            let _ = output.error(&format!("Error: {}", e));
            if let Some(details) = e.details() {
                for line in details.lines() {
                    let _ = output.indent(line);
                }
            }
            for suggestion in e.recovery_suggestions() {
                let _ = output.indent(&format!("hint: {}", suggestion));
            }
            1
        }
    };

    process::exit(exit_code);
}
