//! Translation of [`BuildOptions`] into toolchain invocations.
//!
//! | tool      | working dir        | debug                     | release                                                   |
//! |-----------|--------------------|---------------------------|-----------------------------------------------------------|
//! | gradle    | `<project>/android`| `assembleDebug --info`    | `assembleRelease --stacktrace [-PminifyEnabled=true]`     |
//! | capacitor | `<project>`        | `cap build android`       | `cap build android --release --keystore <p> ...`          |

use crate::packager::{
    BuildOptions, BuildTool, BuildType,
    project::ANDROID_DIR,
    tool_detection::{gradle_wrapper, npx_program},
    utils::process::Invocation,
};
use std::path::{Path, PathBuf};

pub const MINIFY_PROPERTY: &str = "-PminifyEnabled=true";

/// Gradle task arguments for the requested variant.
pub fn gradle_arguments(options: &BuildOptions) -> Vec<String> {
    let mut args: Vec<String> = match options.build_type() {
        BuildType::Debug => vec!["assembleDebug".into(), "--info".into()],
        BuildType::Release => vec!["assembleRelease".into(), "--stacktrace".into()],
    };
    if options.release && options.minify_web {
        args.push(MINIFY_PROPERTY.into());
    }
    args
}

/// `npx` arguments for `cap build android`.
///
/// Release signing flags always appear in the order `--release`,
/// `--keystore`, `--keystore-password`, `--key-alias`, `--key-password`.
/// The key password falls back to the keystore password.
pub fn capacitor_arguments(options: &BuildOptions) -> Vec<String> {
    let mut args: Vec<String> = vec!["cap".into(), "build".into(), "android".into()];
    if !options.release {
        return args;
    }

    args.push("--release".into());
    if let Some(keystore) = &options.keystore {
        args.extend([
            "--keystore".to_string(),
            keystore.path.display().to_string(),
            "--keystore-password".to_string(),
            keystore.password.clone(),
            "--key-alias".to_string(),
            keystore.alias.clone(),
            "--key-password".to_string(),
            keystore.key_password().to_string(),
        ]);
    }
    args
}

/// Canonical directory the build runs in.
///
/// Gradle always runs inside `<project>/android`; the Capacitor CLI always
/// runs at the project root and descends into `android/` itself.
pub fn build_working_dir(project: &Path, tool: BuildTool) -> PathBuf {
    match tool {
        BuildTool::Gradle => project.join(ANDROID_DIR),
        BuildTool::Capacitor => project.to_path_buf(),
    }
}

/// Complete invocation for one build.
pub fn build_invocation(project: &Path, options: &BuildOptions) -> Invocation {
    let cwd = build_working_dir(project, options.build_tool);
    let invocation = match options.build_tool {
        // The child's working dir does not take part in program lookup on Windows.
        BuildTool::Gradle => Invocation::new(cwd.join(gradle_wrapper()).display().to_string(), &cwd)
            .args(gradle_arguments(options)),
        BuildTool::Capacitor => Invocation::new(npx_program(), &cwd).args(capacitor_arguments(options)),
    };
    invocation.timeout(options.timeout)
}

/// Directory Gradle writes APKs for `build_type` into.
pub fn apk_output_dir(project: &Path, build_type: BuildType) -> PathBuf {
    project
        .join(ANDROID_DIR)
        .join("app")
        .join("build")
        .join("outputs")
        .join("apk")
        .join(build_type.as_str())
}
