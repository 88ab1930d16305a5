//! Worker pool management
//!
//! One pool per process context, created lazily on first use and reused by
//! every later run. There is no sequential fallback: fewer than two workers
//! is rejected.

use crate::core::PipelineError;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Smallest accepted worker count
pub const MIN_WORKERS: usize = 2;

/// A running set of parallel workers
pub trait WorkerPool: Send + Sync {
    fn num_workers(&self) -> usize;

    /// Run `job` inside the pool
    fn install(&self, job: Box<dyn FnOnce() + Send + '_>);
}

/// Creates worker pools; swapped for a fake in tests
pub trait PoolBackend: Send + Sync {
    /// Whether parallel execution can be used at all in this environment
    fn check_capability(&self) -> Result<(), String>;

    fn create(&self, num_workers: usize) -> Result<Arc<dyn WorkerPool>, String>;
}

/// Cloneable handle to the active pool
#[derive(Clone)]
pub struct PoolHandle {
    id: Uuid,
    pool: Arc<dyn WorkerPool>,
}

impl PoolHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn num_workers(&self) -> usize {
        self.pool.num_workers()
    }

    /// Run a closure on the pool and wait for it
    pub fn install<'a, F: FnOnce() + Send + 'a>(&self, job: F) {
        self.pool.install(Box::new(job));
    }

    /// True if both handles refer to the same pool
    pub fn same_pool(&self, other: &PoolHandle) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("id", &self.id)
            .field("num_workers", &self.num_workers())
            .finish()
    }
}

/// Reject worker counts that would mean sequential execution
pub fn check_worker_count(num_workers: usize) -> Result<(), PipelineError> {
    if num_workers < MIN_WORKERS {
        return Err(PipelineError::SequentialModeUnsupported {
            requested: num_workers,
        });
    }
    Ok(())
}

/// Owns the (at most one) active worker pool
pub struct ParallelExecutionManager {
    backend: Box<dyn PoolBackend>,
    active: Mutex<Option<PoolHandle>>,
}

impl ParallelExecutionManager {
    pub fn new<B: PoolBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            active: Mutex::new(None),
        }
    }

    /// Manager backed by rayon thread pools
    pub fn with_rayon() -> Self {
        Self::new(RayonBackend)
    }

    fn slot(&self) -> MutexGuard<'_, Option<PoolHandle>> {
        // A panic while holding the lock cannot leave the slot half-written
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the active pool, creating one of `num_workers` if none exists.
    ///
    /// An existing pool is returned unchanged even if its size differs.
    pub fn ensure_pool(&self, num_workers: usize) -> Result<PoolHandle, PipelineError> {
        check_worker_count(num_workers)?;
        self.backend
            .check_capability()
            .map_err(PipelineError::CapabilityMissing)?;

        let mut slot = self.slot();
        if let Some(handle) = slot.as_ref() {
            if handle.num_workers() != num_workers {
                warn!(
                    "Reusing existing pool with {} workers ({} requested)",
                    handle.num_workers(),
                    num_workers
                );
            } else {
                debug!("Reusing existing pool {}", handle.id);
            }
            return Ok(handle.clone());
        }

        let pool = self
            .backend
            .create(num_workers)
            .map_err(|reason| PipelineError::PoolCreation {
                requested: num_workers,
                reason,
            })?;
        let handle = PoolHandle {
            id: Uuid::new_v4(),
            pool,
        };
        info!("Started worker pool with {} workers", handle.num_workers());
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Alias of [`ensure_pool`](Self::ensure_pool)
    pub fn acquire(&self, num_workers: usize) -> Result<PoolHandle, PipelineError> {
        self.ensure_pool(num_workers)
    }

    /// Drop the active pool; returns whether one existed.
    ///
    /// Workers shut down once the last outstanding handle is dropped.
    pub fn release(&self) -> bool {
        let released = self.slot().take();
        if let Some(handle) = &released {
            info!("Released worker pool {}", handle.id);
        }
        released.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Handle to the active pool, if any
    pub fn current(&self) -> Option<PoolHandle> {
        self.slot().clone()
    }
}

/// Pool backend built on `rayon::ThreadPool`
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonBackend;

struct RayonPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool for RayonPool {
    fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn install(&self, job: Box<dyn FnOnce() + Send + '_>) {
        self.pool.install(job)
    }
}

impl PoolBackend for RayonBackend {
    fn check_capability(&self) -> Result<(), String> {
        std::thread::available_parallelism()
            .map(|_| ())
            .map_err(|e| format!("cannot query available parallelism: {}", e))
    }

    fn create(&self, num_workers: usize) -> Result<Arc<dyn WorkerPool>, String> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("mgpipe-worker-{}", i))
            .build()
            .map_err(|e| format!("failed to create thread pool: {}", e))?;
        Ok(Arc::new(RayonPool { pool }))
    }
}
