//! `build`: sync, build and (for release) sign.

use super::find_config;
use crate::cli::{BuildArgs, RuntimeConfig};
use crate::config::BuildOverrides;
use crate::error::Result;
use crate::packager::{BuildOptionsBuilder, Pipeline, StepStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(args: &BuildArgs, runtime_config: &RuntimeConfig) -> Result<i32> {
    let config = find_config(args.config.as_deref(), &[args.project.as_path(), Path::new(".")])?;
    let keystore = args.keystore.to_config()?;

    let options = match &config {
        Some(config) => config.build_options(BuildOverrides {
            release: args.release.then_some(true),
            output_dir: args.output_dir.clone(),
            minify_web: args.minify.then_some(true),
            tool: args.tool,
            timeout_secs: args.timeout,
            keystore,
        })?,
        None => {
            let mut builder = BuildOptionsBuilder::new()
                .release(args.release)
                .minify_web(args.minify)
                .build_tool(args.tool.unwrap_or_default())
                .maybe_keystore(keystore);
            if let Some(dir) = &args.output_dir {
                builder = builder.output_dir(dir);
            }
            if let Some(secs) = args.timeout {
                builder = builder.timeout((secs > 0).then(|| Duration::from_secs(secs)));
            }
            builder.build()?
        }
    };

    let mut pipeline = Pipeline::new();
    if runtime_config.output().is_verbose() {
        let output = *runtime_config.output();
        pipeline = pipeline.on_progress(Arc::new(move |line: &str| {
            let _ = output.indent(line);
        }));
    }

    if let Some(config) = config.as_ref().filter(|_| !args.skip_assets) {
        runtime_config.progress("Copying web assets")?;
        pipeline.refresh_web_assets(config.app_config(), &args.project).await?;
    }

    runtime_config.section(&format!(
        "Building {} APK with {}",
        options.build_type(),
        options.build_tool
    ))?;
    let outcome = pipeline.build(&args.project, &options).await?;

    for step in outcome.steps.iter().filter(|s| s.status == StepStatus::Completed) {
        let seconds = step
            .duration()
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();
        runtime_config.verbose_println(&format!("{:<20} {:>7.1}s", step.name, seconds))?;
    }
    if let Some(checksum) = &outcome.artifact.checksum {
        runtime_config.verbose_println(&format!("SHA256: {}", checksum))?;
    }
    if options.release {
        runtime_config.success("Signed and verified")?;
    }
    runtime_config.success(&format!(
        "Built {} ({} bytes)",
        outcome.artifact.path.display(),
        outcome.artifact.size_bytes
    ))?;
    runtime_config.output().println(&outcome.artifact.path.display().to_string())?;
    Ok(0)
}
