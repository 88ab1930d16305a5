//! mgpipe - configuration and orchestration front-end for microbiome
//! community metabolic modeling

pub mod cli;
pub mod core;
pub mod engine;
pub mod execution;

// Re-export commonly used types
pub use core::{Configuration, OptionalParams, PipelineError, RequiredParams};
pub use engine::{EngineClientConfig, EngineError, ModelingEngine, PipelineResult, SubprocessEngine};
pub use execution::{ParallelExecutionManager, PipelineEvent, PipelineOrchestrator, ProcessContext};
