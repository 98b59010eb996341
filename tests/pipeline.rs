//! End-to-end pipeline runs against scripted toolchains.

use kodegen_bundler_apk::packager::testing::{RecordingFileSystem, ScriptedResponse, ScriptedRunner};
use kodegen_bundler_apk::packager::{
    AppConfig, BuildOptionsBuilder, ErrorKind, Invocation, KeystoreConfig, Pipeline, ProjectState,
    TokioFileSystem,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Workspace {
    _dir: tempfile::TempDir,
    web: PathBuf,
    project: PathBuf,
    out: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let web = dir.path().join("dist");
    std::fs::create_dir_all(web.join("assets")).unwrap();
    std::fs::write(web.join("index.html"), "<html><body>todo</body></html>").unwrap();
    std::fs::write(web.join("assets/app.js"), "console.log('todo')").unwrap();
    Workspace {
        web,
        project: dir.path().join("todo-android"),
        out: dir.path().join("out"),
        _dir: dir,
    }
}

fn value_after(inv: &Invocation, flag: &str) -> String {
    let args = inv.arguments();
    let at = args.iter().position(|a| a == flag).unwrap();
    args[at + 1].clone()
}

/// Toolchain that behaves like Capacitor + Gradle on a healthy machine.
fn toolchain(project: &Path) -> ScriptedRunner {
    let android = project.join("android");
    let outputs = android.join("app/build/outputs/apk");
    let debug = outputs.join("debug");
    let release = outputs.join("release");
    ScriptedRunner::new()
        .on_arg(
            "add",
            ScriptedResponse::success()
                .stdout("✔ Adding native android project in android")
                .with_effect(move |_| std::fs::create_dir_all(&android).unwrap()),
        )
        .on_arg(
            "assembleDebug",
            ScriptedResponse::success()
                .stdout("> Task :app:assembleDebug")
                .stdout("BUILD SUCCESSFUL in 41s")
                .with_effect(move |_| {
                    std::fs::create_dir_all(&debug).unwrap();
                    std::fs::write(debug.join("app-debug.apk"), b"PK\x03\x04debug").unwrap();
                }),
        )
        .on_arg(
            "assembleRelease",
            ScriptedResponse::success()
                .stdout("BUILD SUCCESSFUL in 1m 3s")
                .with_effect(move |_| {
                    std::fs::create_dir_all(&release).unwrap();
                    std::fs::write(release.join("app-release-unsigned.apk"), b"PK\x03\x04release").unwrap();
                }),
        )
        .on_arg(
            "sign",
            ScriptedResponse::success().with_effect(|inv| {
                std::fs::write(value_after(inv, "--out"), b"PK\x03\x04signed").unwrap();
            }),
        )
        .on_arg(
            "verify",
            ScriptedResponse::success()
                .stdout("Verifies")
                .stdout("Verified using v2 scheme (APK Signature Scheme v2): true"),
        )
}

fn apks_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".apk"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn debug_build_from_scratch() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

    let config = AppConfig::new("com.example.todo", "Todo", &ws.web);
    let state = pipeline.initialize_project(&config, &ws.project).await.unwrap();
    assert_eq!(state, ProjectState::Synced);
    assert!(ws.project.join("www/assets/app.js").is_file());

    let options = BuildOptionsBuilder::new().output_dir(&ws.out).build().unwrap();
    let apk = pipeline.build_apk(&ws.project, &options).await.unwrap();

    assert!(apk.starts_with(&ws.out));
    let names = apks_in(&ws.out);
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("app-debug-"));
    assert_eq!(std::fs::read(&apk).unwrap(), b"PK\x03\x04debug");

    let programs: Vec<String> = runner
        .calls()
        .iter()
        .map(|c| c.arguments().join(" "))
        .collect();
    assert_eq!(
        programs,
        [
            "install --no-audit --no-fund",
            "cap add android",
            "cap sync android",
            "cap sync android",
            "assembleDebug --info",
        ]
    );
    assert!(runner.calls().iter().all(|c| c.arguments()[0] != "sign"));
}

#[tokio::test]
async fn release_minify_build_is_signed() {
    let ws = workspace();
    let keystore_path = ws.web.parent().unwrap().join("release.jks");
    std::fs::write(&keystore_path, b"keystore").unwrap();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

    let config = AppConfig::new("com.example.todo", "Todo", &ws.web);
    pipeline.initialize_project(&config, &ws.project).await.unwrap();

    let options = BuildOptionsBuilder::new()
        .output_dir(&ws.out)
        .release(true)
        .minify_web(true)
        .keystore(KeystoreConfig::new(&keystore_path, "store-pw", "upload", ""))
        .build()
        .unwrap();
    let apk = pipeline.build_apk(&ws.project, &options).await.unwrap();

    let name = apk.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("app-release-") && name.ends_with(".apk"));
    assert!(apk.starts_with(&ws.out));
    assert_eq!(std::fs::read(&apk).unwrap(), b"PK\x03\x04signed");
    assert_eq!(apks_in(&ws.out), vec![name]);

    let calls = runner.calls();
    let build = calls.iter().find(|c| c.arguments()[0] == "assembleRelease").unwrap();
    assert!(build.arguments().iter().any(|a| a == "-PminifyEnabled=true"));
    let sign = calls.iter().find(|c| c.arguments()[0] == "sign").unwrap();
    assert_eq!(sign.arguments().last().unwrap(), &apk.display().to_string());
    assert_eq!(value_after(sign, "--key-pass"), "pass:store-pw");
}

#[tokio::test]
async fn release_without_keystore_spawns_nothing() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

    let options = kodegen_bundler_apk::packager::BuildOptions {
        release: true,
        output_dir: ws.out.clone(),
        minify_web: false,
        keystore: None,
        build_tool: Default::default(),
        timeout: None,
    };
    let err = pipeline.build_apk(&ws.project, &options).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("keystore"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn missing_project_is_reported_before_sync() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));

    let options = BuildOptionsBuilder::new().output_dir(&ws.out).build().unwrap();
    let err = pipeline.build_apk(&ws.project, &options).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Build);
    assert!(err.message().contains("project not found"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn gradle_failure_keeps_output_dir_clean() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));
    pipeline
        .initialize_project(&AppConfig::new("com.example.todo", "Todo", &ws.web), &ws.project)
        .await
        .unwrap();

    runner.push_rule_arg(
        "assembleDebug",
        ScriptedResponse::failure(
            1,
            "e: /src/MainActivity.kt:12:5 Unresolved reference: Bridge\n\nFAILURE: Build failed with an exception.",
        ),
    );
    let options = BuildOptionsBuilder::new().output_dir(&ws.out).build().unwrap();
    let err = pipeline.build_apk(&ws.project, &options).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Build);
    assert!(err.message().contains("Unresolved reference"));
    assert!(!ws.out.exists());
}

fn release_options(ws: &Workspace) -> kodegen_bundler_apk::packager::BuildOptions {
    let keystore_path = ws.web.parent().unwrap().join("release.jks");
    std::fs::write(&keystore_path, b"keystore").unwrap();
    BuildOptionsBuilder::new()
        .output_dir(&ws.out)
        .release(true)
        .keystore(KeystoreConfig::new(&keystore_path, "store-pw", "upload", ""))
        .build()
        .unwrap()
}

#[tokio::test]
async fn failed_signing_leaves_no_release_apk() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let fs = Arc::new(RecordingFileSystem::new());
    let pipeline = Pipeline::with_capabilities(runner.clone(), fs.clone());
    pipeline
        .initialize_project(&AppConfig::new("com.example.todo", "Todo", &ws.web), &ws.project)
        .await
        .unwrap();

    runner.push_rule_arg(
        "sign",
        ScriptedResponse::failure(1, "Failed to load signer \"signer #1\": wrong password"),
    );
    let err = pipeline.build_apk(&ws.project, &release_options(&ws)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Signing);
    assert!(apks_in(&ws.out).is_empty());
    assert_eq!(runner.count_program("apksigner"), 1);
    let out = ws.out.display().to_string();
    assert!(
        fs.ops()
            .iter()
            .any(|op| op.starts_with("remove_file ") && op.contains(&out) && op.contains("app-release-"))
    );
}

#[tokio::test]
async fn signed_release_reports_checksum_of_signed_bytes() {
    let ws = workspace();
    let runner = Arc::new(toolchain(&ws.project));
    let pipeline = Pipeline::with_capabilities(runner.clone(), Arc::new(TokioFileSystem));
    pipeline
        .initialize_project(&AppConfig::new("com.example.todo", "Todo", &ws.web), &ws.project)
        .await
        .unwrap();

    let outcome = pipeline.build(&ws.project, &release_options(&ws)).await.unwrap();

    assert_eq!(outcome.artifact.size_bytes, b"PK\x03\x04signed".len() as u64);
    assert_eq!(
        outcome.artifact.checksum.as_deref(),
        Some("6de255ab24229d349de761f13aff53aa4544889283ed49036887754134915e69")
    );
}
