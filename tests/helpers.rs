//! Test utility functions for mgpipe
#![allow(dead_code)]

use async_trait::async_trait;
use mgpipe::core::{OptionalParams, RequiredParams};
use mgpipe::engine::{EngineError, EngineRequest, ModelingEngine, PipelineResult};
use mgpipe::execution::{
    ParallelExecutionManager, PipelineEvent, PipelineOrchestrator, PoolBackend, ProcessContext,
    WorkerPool,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Mock engine that records each request and returns a canned result
#[derive(Clone, Default)]
pub struct MockEngine {
    pub runs: Arc<AtomicUsize>,
    pub inits: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<serde_json::Value>>>,
    pub fail_with: Option<String>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Result every successful [`MockEngine`] run returns
pub fn canned_result() -> PipelineResult {
    PipelineResult {
        net_secretion_fluxes: json!({ "EX_ac[fe]": [1.5, 2.5] }),
        net_uptake_fluxes: json!({ "EX_glc_D[fe]": [-10.0, -9.0] }),
        ordination: json!([[0.1, -0.2], [-0.1, 0.2]]),
        model_stats: json!({ "reactions": [1200, 1180] }),
        summary: json!({ "meanReactions": 1190 }),
        stratified_stats: serde_json::Value::Null,
        models_ok: true,
    }
}

#[async_trait]
impl ModelingEngine for MockEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn run(&self, request: &EngineRequest<'_>) -> Result<PipelineResult, EngineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());

        match &self.fail_with {
            Some(message) => Err(EngineError::Internal(message.clone())),
            None => Ok(canned_result()),
        }
    }
}

/// Pool that runs jobs inline on the calling thread
pub struct FakePool {
    workers: usize,
}

impl WorkerPool for FakePool {
    fn num_workers(&self) -> usize {
        self.workers
    }

    fn install(&self, job: Box<dyn FnOnce() + Send + '_>) {
        job()
    }
}

/// Backend handing out [`FakePool`]s and counting how many were created
#[derive(Clone)]
pub struct FakePoolBackend {
    pub created: Arc<AtomicUsize>,
    pub capable: bool,
}

impl FakePoolBackend {
    pub fn new() -> Self {
        Self {
            created: Arc::new(AtomicUsize::new(0)),
            capable: true,
        }
    }

    pub fn incapable() -> Self {
        Self {
            capable: false,
            ..Self::new()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl PoolBackend for FakePoolBackend {
    fn check_capability(&self) -> Result<(), String> {
        if self.capable {
            Ok(())
        } else {
            Err("parallel runtime not installed".to_string())
        }
    }

    fn create(&self, num_workers: usize) -> Result<Arc<dyn WorkerPool>, String> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakePool {
            workers: num_workers,
        }))
    }
}

/// On-disk inputs for one run, rooted in a temporary directory
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Model directory, default diet, and a normalized two-sample table
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        std::fs::create_dir(fixture.path("models")).unwrap();
        fixture.write("AverageEuropeanDiet.txt", "EX_glc_D(e)\t-10\n");
        fixture.write_abundance(&[
            ("Bacteroides", vec![0.6, 0.5]),
            ("Prevotella", vec![0.4, 0.495]),
        ]);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write `abundance.csv`; each row is (organism, per-sample values)
    pub fn write_abundance(&self, rows: &[(&str, Vec<f64>)]) -> PathBuf {
        let samples = rows.first().map(|(_, values)| values.len()).unwrap_or(0);
        let mut content = String::from("ID");
        for i in 0..samples {
            content.push_str(&format!(",S{}", i + 1));
        }
        content.push('\n');
        for (name, values) in rows {
            content.push_str(name);
            for value in values.iter() {
                content.push_str(&format!(",{}", value));
            }
            content.push('\n');
        }
        self.write("abundance.csv", &content)
    }

    pub fn required(&self) -> RequiredParams {
        RequiredParams::new(self.path("models"), self.path("abundance.csv"), true)
    }

    /// Optional parameters with the result directory kept inside the fixture
    pub fn optional(&self) -> OptionalParams {
        OptionalParams::new().with_result_path(self.path("out"))
    }
}

/// Orchestrator over a fake pool, resolving relative names in the fixture
pub fn orchestrator(
    fixture: &Fixture,
    engine: MockEngine,
    backend: FakePoolBackend,
) -> PipelineOrchestrator<MockEngine> {
    let context = Arc::new(ProcessContext::new(ParallelExecutionManager::new(backend)));
    PipelineOrchestrator::new(context, engine).with_base_dir(fixture.root())
}

/// Collect every event an orchestrator emits
pub fn record_events<E: ModelingEngine>(
    orchestrator: &PipelineOrchestrator<E>,
) -> Arc<Mutex<Vec<PipelineEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    orchestrator.add_event_handler(move |event| sink.lock().unwrap().push(event));
    events
}
