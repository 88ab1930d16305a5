//! Engine result and error types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error types for modeling engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to launch engine '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("Engine exited with code {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid engine output: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Aggregated engine outputs.
///
/// This layer never interprets these values; they are handed back to the
/// caller exactly as the engine produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// Net secretion fluxes per sample
    #[serde(default)]
    pub net_secretion_fluxes: Value,

    /// Net uptake fluxes per sample
    #[serde(default)]
    pub net_uptake_fluxes: Value,

    /// Ordination (multidimensional scaling) coordinates
    #[serde(default)]
    pub ordination: Value,

    /// Per-model reaction and metabolite statistics
    #[serde(default)]
    pub model_stats: Value,

    /// Summary table of the reaction/metabolite statistics
    #[serde(default)]
    pub summary: Value,

    /// Stratified significance statistics (empty without an info file)
    #[serde(default)]
    pub stratified_stats: Value,

    /// Whether every community model was built and solved correctly
    #[serde(default)]
    pub models_ok: bool,
}
