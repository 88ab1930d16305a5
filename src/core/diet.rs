//! Diet file resolution
//!
//! A diet is either one file shared by every individual or one file per
//! individual, listed in the same order as the abundance table samples.

use crate::core::config::DietInput;
use crate::core::error::{FileRole, PipelineError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions accepted as-is; anything else gets [`DEFAULT_DIET_EXTENSION`]
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["txt", "csv", "tsv"];

pub const DEFAULT_DIET_EXTENSION: &str = "txt";

/// Resolved diet: canonical paths to existing files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "paths")]
pub enum DietSpec {
    Shared(PathBuf),
    PerIndividual(Vec<PathBuf>),
}

impl DietSpec {
    /// Diet file used for the sample at `index`
    pub fn for_sample(&self, index: usize) -> Option<&Path> {
        match self {
            DietSpec::Shared(path) => Some(path),
            DietSpec::PerIndividual(paths) => paths.get(index).map(PathBuf::as_path),
        }
    }

    pub fn is_personalized(&self) -> bool {
        matches!(self, DietSpec::PerIndividual(_))
    }
}

/// Turns user-supplied diet names into [`DietSpec`]s
#[derive(Debug, Clone)]
pub struct DietResolver {
    base_dir: PathBuf,
}

impl DietResolver {
    /// Relative diet names are looked up under `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a diet specification for a table with `sample_count` samples
    pub fn resolve(&self, input: &DietInput, sample_count: usize) -> Result<DietSpec, PipelineError> {
        match input {
            DietInput::Shared(name) => {
                let path = self.resolve_path(name)?;
                debug!("Using shared diet {}", path.display());
                Ok(DietSpec::Shared(path))
            }
            DietInput::PerIndividual(names) => {
                if names.len() != sample_count {
                    return Err(PipelineError::validation(
                        "dietFilePath",
                        format!(
                            "{} per-individual diets given for {} samples",
                            names.len(),
                            sample_count
                        ),
                    ));
                }
                let paths = names
                    .iter()
                    .map(|name| self.resolve_path(name))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("Using {} per-individual diets", paths.len());
                Ok(DietSpec::PerIndividual(paths))
            }
        }
    }

    /// Resolve one diet name to the canonical path of an existing file.
    ///
    /// `"Diet"` and `"Diet.txt"` resolve to the same path.
    pub fn resolve_path(&self, name: &str) -> Result<PathBuf, PipelineError> {
        let candidate = self.base_dir.join(with_diet_extension(name));
        if !candidate.is_file() {
            return Err(PipelineError::missing(FileRole::Diet, candidate));
        }
        Ok(candidate.canonicalize()?)
    }

    /// Whether stratified statistics are possible for this run.
    ///
    /// Absence of an info file is accepted with a warning; a named but
    /// missing info file is an error.
    pub fn stratification(info_file_path: Option<&Path>) -> Result<bool, PipelineError> {
        match info_file_path {
            Some(path) if path.is_file() => Ok(true),
            Some(path) => Err(PipelineError::missing(FileRole::Info, path)),
            None => {
                warn!("No stratification file provided, group statistics will be skipped");
                Ok(false)
            }
        }
    }
}

/// Append the default extension unless `name` already has a recognized one
pub fn with_diet_extension(name: &str) -> PathBuf {
    let path = PathBuf::from(name);
    let recognized = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| RECOGNIZED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if recognized {
        path
    } else {
        PathBuf::from(format!("{}.{}", name, DEFAULT_DIET_EXTENSION))
    }
}
