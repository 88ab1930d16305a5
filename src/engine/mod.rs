//! Boundary to the external metabolic modeling engine
//!
//! Flux analysis, statistics and ordination all happen behind
//! [`ModelingEngine`]; this crate only prepares the request and hands the
//! result back untouched.

pub mod client;
pub mod response;
pub mod subprocess_client;

use crate::core::{Configuration, DietSpec};
use crate::execution::PoolHandle;
use async_trait::async_trait;
use serde::Serialize;

pub use client::EngineClientConfig;
pub use response::{EngineError, PipelineResult};
pub use subprocess_client::SubprocessEngine;

/// Everything the engine needs for one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest<'a> {
    pub config: &'a Configuration,
    /// Sample labels, in abundance table order
    pub samples: &'a [String],
    pub diet: &'a DietSpec,
    /// True when an info file allows stratified statistics
    pub stratified: bool,
    pub num_workers: usize,
    /// Worker pool for engines running in-process
    #[serde(skip)]
    pub pool: &'a PoolHandle,
}

/// Trait for modeling engines - allows for different implementations
#[async_trait]
pub trait ModelingEngine: Send + Sync {
    /// One-time setup (solver selection, toolbox loading).
    ///
    /// Called at most once per process context, before the first run.
    async fn initialize(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Run the full modeling pipeline for one request
    async fn run(&self, request: &EngineRequest<'_>) -> Result<PipelineResult, EngineError>;
}
