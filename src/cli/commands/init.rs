//! `init`: create a Capacitor project from `apk.toml`.

use super::find_config;
use crate::cli::{InitArgs, RuntimeConfig};
use crate::error::{CliError, Result};
use crate::packager::Pipeline;
use std::path::Path;

pub async fn execute(args: &InitArgs, runtime_config: &RuntimeConfig) -> Result<i32> {
    let config = find_config(args.config.as_deref(), &[Path::new(".")])?.ok_or_else(|| {
        CliError::MissingArgument {
            argument: "--config (no apk.toml in the current directory)".to_string(),
        }
    })?;
    let app = config.app_config();
    app.validate()?;

    runtime_config.section(&format!("Initializing {} ({})", app.app_name, app.app_id))?;
    runtime_config.progress(&format!("Creating project at {}", args.project.display()))?;

    let state = Pipeline::new().initialize_project(app, &args.project).await?;

    runtime_config.verbose_println(&format!("Project state: {}", state))?;
    runtime_config.success(&format!("Project ready at {}", args.project.display()))?;
    Ok(0)
}
