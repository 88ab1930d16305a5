//! Process context - state that outlives a single pipeline run

use crate::engine::{EngineError, ModelingEngine};
use crate::execution::ParallelExecutionManager;
use tokio::sync::OnceCell;
use tracing::info;

/// Process-wide resources shared by consecutive runs.
///
/// Holds the worker pool manager and remembers whether the engine has been
/// initialized. Initialization happens once per context and is never
/// repeated, even if later runs use a different configuration.
pub struct ProcessContext {
    pool_manager: ParallelExecutionManager,
    engine_ready: OnceCell<()>,
}

impl ProcessContext {
    pub fn new(pool_manager: ParallelExecutionManager) -> Self {
        Self {
            pool_manager,
            engine_ready: OnceCell::new(),
        }
    }

    /// Context with a rayon-backed pool manager
    pub fn with_rayon() -> Self {
        Self::new(ParallelExecutionManager::with_rayon())
    }

    pub fn pool_manager(&self) -> &ParallelExecutionManager {
        &self.pool_manager
    }

    pub fn engine_initialized(&self) -> bool {
        self.engine_ready.initialized()
    }

    /// Initialize `engine` unless this context already did.
    ///
    /// A failed initialization is not remembered; the next call tries again.
    pub async fn initialize_engine<E>(&self, engine: &E) -> Result<(), EngineError>
    where
        E: ModelingEngine + ?Sized,
    {
        self.engine_ready
            .get_or_try_init(|| async {
                engine.initialize().await?;
                info!("Modeling engine initialized");
                Ok::<(), EngineError>(())
            })
            .await?;
        Ok(())
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::with_rayon()
    }
}
