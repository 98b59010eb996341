//! `doctor`: report which external tools are available.

use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};
use crate::packager::tool_detection::detect_tools;

pub async fn execute(runtime_config: &RuntimeConfig) -> Result<i32> {
    runtime_config.section("External tools")?;

    let mut missing = Vec::new();
    for tool in detect_tools() {
        match &tool.path {
            Some(path) => runtime_config.success(&format!("{:<10} {}", tool.name, path.display()))?,
            None => {
                runtime_config.warn(&format!("{:<10} not found (needed for {})", tool.name, tool.purpose))?;
                missing.push(tool.name.to_string());
            }
        }
    }

    if !missing.is_empty() {
        return Err(CliError::MissingTools { tools: missing }.into());
    }
    runtime_config.success("All tools available")?;
    Ok(0)
}
