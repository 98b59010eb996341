//! Command line interface for the APK packager.
//!
//! This module provides the CLI for packaging operations,
//! with argument parsing, command execution, and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{Args, BuildArgs, Command, InitArgs, KeystoreArgs, RuntimeConfig, SignArgs};
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()?;
    let runtime_config = RuntimeConfig::from(&args);

    match &args.command {
        Command::Init(init) => commands::init::execute(init, &runtime_config).await,
        Command::Build(build) => commands::build::execute(build, &runtime_config).await,
        Command::Sign(sign) => commands::sign::execute(sign, &runtime_config).await,
        Command::Doctor => commands::doctor::execute(&runtime_config).await,
    }
}
