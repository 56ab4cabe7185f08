//! Launching the upstream resilience model when its outputs are missing

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use std::process::Command;

/// Make sure the model data directory exists, running the model if needed
///
/// The configured command is split on whitespace and executed without a
/// shell; `model_args` follow it unsplit, so they may contain spaces.
/// Returns `true` when the model had to be run.
pub fn ensure_model_data(config: &PipelineConfig) -> Result<bool> {
    if config.model_data_dir.is_dir() {
        return Ok(false);
    }

    let command = match config.model_command.as_deref() {
        Some(command) if !command.trim().is_empty() => command,
        _ => return Err(PipelineError::MissingModelData(config.model_data_dir.clone())),
    };

    println!("Model data not found. Running the model first...");
    log::info!("Running upstream model: {}", command);

    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or_default();
    let status = Command::new(program)
        .args(parts)
        .args(&config.model_args)
        .status()
        .map_err(|e| PipelineError::UpstreamFailed {
            command: command.to_string(),
            status: e.to_string(),
        })?;

    if !status.success() {
        return Err(PipelineError::UpstreamFailed {
            command: command.to_string(),
            status: status.to_string(),
        });
    }
    if !config.model_data_dir.is_dir() {
        return Err(PipelineError::MissingModelData(config.model_data_dir.clone()));
    }
    Ok(true)
}
