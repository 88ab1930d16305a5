//! Run execution: worker pool, process context and orchestration

pub mod context;
pub mod orchestrator;
pub mod pool;
pub mod workdir;

pub use context::ProcessContext;
pub use orchestrator::{PipelineEvent, PipelineOrchestrator, PreparedRun, RunOutcome};
pub use pool::{ParallelExecutionManager, PoolBackend, PoolHandle, RayonBackend, WorkerPool};
pub use workdir::WorkingDirGuard;
