//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with the
//! validation that clap alone cannot express.

use crate::config::{KEY_PASSWORD_ENV, KEYSTORE_PASSWORD_ENV};
use crate::error::CliError;
use crate::packager::{BuildTool, KeystoreConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Android APK packager for static web bundles
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_apk",
    version,
    about = "Android APK packager for static web bundles",
    long_about = "Packages a directory of static web assets into an Android APK.

Creates a Capacitor project, builds it with Gradle, and signs release builds with apksigner.

Usage:
  kodegen_bundler_apk init ./todo-android --config apk.toml
  kodegen_bundler_apk build ./todo-android
  kodegen_bundler_apk build ./todo-android --release --keystore release.jks --key-alias upload
  kodegen_bundler_apk sign out/app-release-20250101-120000.apk --debug

Exit code 0 = the printed APK path is guaranteed to exist."
)]
pub struct Args {
    /// Show toolchain progress and extra detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, install and sync a new Android project
    Init(InitArgs),
    /// Sync and build an APK; release builds are signed
    Build(BuildArgs),
    /// Sign an existing APK in place
    Sign(SignArgs),
    /// Check that the external tools are installed
    Doctor,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory of the project to create
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Path to apk.toml (defaults to ./apk.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct KeystoreArgs {
    /// Keystore file used for signing
    #[arg(long, value_name = "PATH")]
    pub keystore: Option<PathBuf>,

    /// Keystore password
    #[arg(long, env = KEYSTORE_PASSWORD_ENV, hide_env_values = true)]
    pub keystore_password: Option<String>,

    /// Alias of the signing key
    #[arg(long, value_name = "ALIAS")]
    pub key_alias: Option<String>,

    /// Key password (defaults to the keystore password)
    #[arg(long, env = KEY_PASSWORD_ENV, hide_env_values = true)]
    pub key_password: Option<String>,
}

impl KeystoreArgs {
    /// Keystore from the flags, or `None` when `--keystore` is absent.
    pub fn to_config(&self) -> Result<Option<KeystoreConfig>, CliError> {
        let Some(path) = &self.keystore else {
            return Ok(None);
        };
        let password = self.keystore_password.clone().ok_or_else(|| CliError::MissingArgument {
            argument: format!("--keystore-password (or {})", KEYSTORE_PASSWORD_ENV),
        })?;
        let alias = self.key_alias.clone().ok_or_else(|| CliError::MissingArgument {
            argument: "--key-alias".to_string(),
        })?;
        Ok(Some(KeystoreConfig::new(
            path,
            password,
            alias,
            self.key_password.clone().unwrap_or_default(),
        )))
    }
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Project directory created by `init`
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Path to apk.toml (defaults to <PROJECT>/apk.toml, then ./apk.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Build a release APK (requires a keystore)
    #[arg(long)]
    pub release: bool,

    /// Enable code shrinking for release builds
    #[arg(long)]
    pub minify: bool,

    /// Directory receiving the APK
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Build front-end: gradle or capacitor
    #[arg(long, value_name = "TOOL")]
    pub tool: Option<BuildTool>,

    /// Build timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not copy web assets from the configured web_dir before building
    #[arg(long)]
    pub skip_assets: bool,

    #[command(flatten)]
    pub keystore: KeystoreArgs,
}

#[derive(clap::Args, Debug)]
pub struct SignArgs {
    /// APK to sign in place
    #[arg(value_name = "APK")]
    pub apk: PathBuf,

    /// Sign with ~/.android/debug.keystore, creating it if needed
    #[arg(long, conflicts_with = "keystore")]
    pub debug: bool,

    #[command(flatten)]
    pub keystore: KeystoreArgs,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        match &self.command {
            Command::Build(build) if build.minify && !build.release => Err(CliError::InvalidArguments {
                reason: "--minify only applies to --release builds".to_string(),
            }),
            Command::Sign(sign) if !sign.debug && sign.keystore.keystore.is_none() => {
                Err(CliError::MissingArgument {
                    argument: "--keystore (or --debug)".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
