//! Pipeline orchestrator - validates inputs, prepares the worker pool and
//! delegates the run to the modeling engine

use crate::{
    core::{
        AbundanceTable, AbundanceValidator, ConfigResolver, Configuration, DietResolver, DietSpec,
        FileRole, OptionalParams, PipelineError, RequiredParams,
    },
    engine::{EngineRequest, ModelingEngine, PipelineResult},
    execution::{pool::check_worker_count, PoolHandle, ProcessContext, WorkingDirGuard},
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that can occur while a run is prepared and executed
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    ConfigurationResolved {
        run_id: Uuid,
        result_path: PathBuf,
    },
    ObjectiveDefaulted {
        objective: String,
    },
    AbundanceValidated {
        samples: usize,
        features: usize,
    },
    DietResolved {
        personalized: bool,
        files: usize,
    },
    StratificationMissing,
    PoolReady {
        workers: usize,
        reused: bool,
    },
    Initialized,
    EngineStarted {
        model_path: PathBuf,
        abundance_path: PathBuf,
        result_path: PathBuf,
    },
    EngineFinished {
        success: bool,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Inputs that passed every check and are ready for the engine
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub run_id: Uuid,
    pub config: Configuration,
    pub table: AbundanceTable,
    pub diet: DietSpec,
    pub stratified: bool,
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub config: Configuration,
    /// Engine output, exactly as returned
    pub result: PipelineResult,
}

/// Composes configuration resolution, input validation, pool setup and the
/// engine call
pub struct PipelineOrchestrator<E> {
    context: Arc<ProcessContext>,
    engine: E,
    base_dir: Option<PathBuf>,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<E: ModelingEngine> PipelineOrchestrator<E> {
    pub fn new(context: Arc<ProcessContext>, engine: E) -> Self {
        Self {
            context,
            engine,
            base_dir: None,
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Resolve relative paths against `dir` instead of the working directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.event_handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: PipelineEvent) {
        let handlers = self
            .event_handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    fn resolver(&self) -> Result<ConfigResolver, PipelineError> {
        match &self.base_dir {
            Some(dir) => Ok(ConfigResolver::with_base_dir(dir)),
            None => ConfigResolver::new(),
        }
    }

    /// Resolve and validate everything that can be checked without starting
    /// workers or the engine.
    ///
    /// The worker count is checked before any file is touched.
    pub fn prepare(
        &self,
        required: RequiredParams,
        optional: OptionalParams,
    ) -> Result<PreparedRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let resolver = self.resolver()?;
        let config = resolver.resolve(required, optional)?;

        self.emit_event(PipelineEvent::ConfigurationResolved {
            run_id,
            result_path: config.result_path().to_path_buf(),
        });
        if config.objective_defaulted() {
            self.emit_event(PipelineEvent::ObjectiveDefaulted {
                objective: config.objre().join(", "),
            });
        }

        check_worker_count(config.num_workers())?;

        ensure_exists(FileRole::Model, config.model_path())?;
        if let Some(host) = config.host_path() {
            ensure_exists(FileRole::Model, host)?;
        }

        let table = AbundanceValidator::with_tolerance(config.normalization_tolerance())
            .validate(config.abundance_path())?;
        self.emit_event(PipelineEvent::AbundanceValidated {
            samples: table.sample_count(),
            features: table.feature_count(),
        });

        let diet = DietResolver::new(resolver.base_dir())
            .resolve(config.diet_file_path(), table.sample_count())?;
        self.emit_event(PipelineEvent::DietResolved {
            personalized: diet.is_personalized(),
            files: match &diet {
                DietSpec::Shared(_) => 1,
                DietSpec::PerIndividual(paths) => paths.len(),
            },
        });

        let stratified = DietResolver::stratification(config.info_file_path())?;
        if !stratified {
            self.emit_event(PipelineEvent::StratificationMissing);
        }

        debug!("Run {} prepared", run_id);
        Ok(PreparedRun {
            run_id,
            config,
            table,
            diet,
            stratified,
        })
    }

    /// Full pipeline: prepare, acquire the pool, initialize the engine once,
    /// then run.
    ///
    /// # Arguments
    /// * `required` - Model directory, abundance table and profile flag
    /// * `optional` - Overrides for the documented defaults
    ///
    /// # Returns
    /// A [`RunOutcome`] carrying the resolved configuration and the engine
    /// result exactly as returned
    ///
    /// # Errors
    /// Returns `PipelineError` if:
    /// - Fewer than two workers are requested
    /// - A parameter, input file or the abundance normalization check fails
    /// - The worker pool cannot be used or created
    /// - Engine initialization or the engine run fails (no retry)
    pub async fn execute(
        &self,
        required: RequiredParams,
        optional: OptionalParams,
    ) -> Result<RunOutcome, PipelineError> {
        let _cwd = WorkingDirGuard::acquire()?;
        let started_at = Utc::now();

        let prepared = self.prepare(required, optional)?;

        let manager = self.context.pool_manager();
        let reused = manager.is_active();
        let pool = manager.ensure_pool(prepared.config.num_workers())?;
        self.emit_event(PipelineEvent::PoolReady {
            workers: pool.num_workers(),
            reused,
        });

        self.context.initialize_engine(&self.engine).await?;
        info!("Pipeline {} initialized", prepared.run_id);
        self.emit_event(PipelineEvent::Initialized);

        let result = self
            .run(&prepared.config, &prepared.table, &prepared.diet, &pool)
            .await?;

        Ok(RunOutcome {
            run_id: prepared.run_id,
            started_at,
            completed_at: Utc::now(),
            config: prepared.config,
            result,
        })
    }

    /// Hand a validated run to the engine and return its result untouched.
    ///
    /// The working directory is restored afterwards whether the engine
    /// succeeds or fails. There is no retry.
    ///
    /// # Arguments
    /// * `config` - Resolved configuration
    /// * `table` - Abundance table that passed the normalization check
    /// * `diet` - Resolved diet files
    /// * `pool` - Active worker pool handed to the engine
    ///
    /// # Errors
    /// Returns `PipelineError::Engine` if the engine call fails, or
    /// `PipelineError::Io` if the working directory cannot be read.
    pub async fn run(
        &self,
        config: &Configuration,
        table: &AbundanceTable,
        diet: &DietSpec,
        pool: &PoolHandle,
    ) -> Result<PipelineResult, PipelineError> {
        let _cwd = WorkingDirGuard::acquire()?;

        info!("Models: {}", config.model_path().display());
        info!("Abundances: {}", config.abundance_path().display());
        info!("Results: {}", config.result_path().display());
        self.emit_event(PipelineEvent::EngineStarted {
            model_path: config.model_path().to_path_buf(),
            abundance_path: config.abundance_path().to_path_buf(),
            result_path: config.result_path().to_path_buf(),
        });

        let request = EngineRequest {
            config,
            samples: &table.samples,
            diet,
            stratified: config.has_stratification(),
            num_workers: pool.num_workers(),
            pool,
        };
        let result = self.engine.run(&request).await;

        self.emit_event(PipelineEvent::EngineFinished {
            success: result.is_ok(),
        });
        match result {
            Ok(result) => {
                info!("Modeling engine finished");
                Ok(result)
            }
            Err(e) => {
                warn!("Modeling engine failed: {}", e);
                Err(e.into())
            }
        }
    }
}

fn ensure_exists(role: FileRole, path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::missing(role, path))
    }
}
