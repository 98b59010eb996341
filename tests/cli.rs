//! Command line behavior that needs no Android toolchain.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_apk").unwrap();
    cmd.env_remove("APK_KEYSTORE_PASSWORD").env_remove("APK_KEY_PASSWORD");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build").and(predicate::str::contains("sign")));
}

#[test]
fn release_build_without_keystore_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["build", "project", "--release"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG error").and(predicate::str::contains("keystore")));
}

#[test]
fn signing_missing_apk_is_signing_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("release.jks"), b"ks").unwrap();
    cli()
        .current_dir(dir.path())
        .args([
            "sign",
            "missing.apk",
            "--keystore",
            "release.jks",
            "--keystore-password",
            "pw",
            "--key-alias",
            "upload",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SIGNING error").and(predicate::str::contains("APK not found")));
}

#[test]
fn init_without_config_names_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["init", "app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn minify_requires_release() {
    cli()
        .args(["build", "project", "--minify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--minify"));
}
