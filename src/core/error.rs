//! Error taxonomy for configuration resolution and pipeline bootstrap

use crate::engine::EngineError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A sample column whose total abundance is above the tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExcess {
    /// Zero-based sample index (the label column is not counted)
    pub index: usize,
    /// Sample label from the header row
    pub sample: String,
    /// Sum of the feature values in this column
    pub total: f64,
}

impl fmt::Display for ColumnExcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} '{}' = {:.4}", self.index, self.sample, self.total)
    }
}

/// What kind of file a missing path was expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Model,
    Abundance,
    Diet,
    Info,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileRole::Model => "model",
            FileRole::Abundance => "abundance",
            FileRole::Diet => "diet",
            FileRole::Info => "stratification info",
        };
        f.write_str(name)
    }
}

/// Errors raised while preparing a pipeline run. All of them are fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid parameter '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error(
        "Abundance table is not normalized (tolerance {tolerance}): {}",
        format_excess(.columns)
    )]
    NotNormalized {
        tolerance: f64,
        columns: Vec<ColumnExcess>,
    },

    #[error("{role} file not found: {}", .path.display())]
    MissingFile { role: FileRole, path: PathBuf },

    #[error("Sequential execution is not supported (requested {requested} worker(s), need at least 2)")]
    SequentialModeUnsupported { requested: usize },

    #[error("Parallel execution is unavailable: {0}")]
    CapabilityMissing(String),

    #[error("Failed to start a worker pool of {requested} workers: {reason}")]
    PoolCreation { requested: usize, reason: String },

    #[error("Failed to read abundance table {}: {source}", .path.display())]
    AbundanceParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse configuration file: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Modeling engine failed: {0}")]
    Engine(#[from] EngineError),
}

impl PipelineError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(role: FileRole, path: impl Into<PathBuf>) -> Self {
        PipelineError::MissingFile {
            role,
            path: path.into(),
        }
    }
}

fn format_excess(columns: &[ColumnExcess]) -> String {
    columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
