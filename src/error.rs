//! Error type shared by the loaders, pipelines and exporters

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Column '{column}' is required but missing for {context}")]
    MissingColumn { column: &'static str, context: String },

    #[error("Invalid {kind} label '{value}'")]
    InvalidLabel { kind: &'static str, value: String },

    #[error("Model data not found at {0} and no upstream model command is configured")]
    MissingModelData(PathBuf),

    #[error("Upstream model command '{command}' failed: {status}")]
    UpstreamFailed { command: String, status: String },

    #[error("Rendering error: {0}")]
    Render(String),
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
