//! Test: Worker pool lifecycle across runs

use crate::helpers::*;
use mgpipe::core::PipelineError;
use mgpipe::execution::PipelineEvent;

/// One worker means sequential mode, which is rejected before any file is read
#[tokio::test]
async fn test_single_worker_aborts_before_validation() {
    let fixture = Fixture::new();
    // Both of these would fail validation if they were reached
    fixture.write_abundance(&[("Bacteroides", vec![3.0])]);
    let engine = MockEngine::new();
    let backend = FakePoolBackend::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), backend.clone());

    for workers in [0, 1] {
        let err = orchestrator
            .execute(
                fixture.required(),
                fixture.optional().with_num_workers(workers).with_diet("Missing"),
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::SequentialModeUnsupported { requested } if requested == workers),
            "unexpected error {:?}",
            err
        );
    }
    assert_eq!(backend.created(), 0);
    assert_eq!(engine.run_count(), 0);
}

/// Two runs in one process share a single pool
#[tokio::test]
async fn test_pool_reused_across_runs() {
    let fixture = Fixture::new();
    let backend = FakePoolBackend::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), backend.clone());
    let events = record_events(&orchestrator);

    orchestrator
        .execute(fixture.required(), fixture.optional().with_num_workers(4))
        .await
        .unwrap();
    let first = orchestrator.context().pool_manager().current().unwrap();

    orchestrator
        .execute(fixture.required(), fixture.optional().with_num_workers(4))
        .await
        .unwrap();
    let second = orchestrator.context().pool_manager().current().unwrap();

    assert!(first.same_pool(&second));
    assert_eq!(backend.created(), 1);

    let pool_events: Vec<bool> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::PoolReady { reused, .. } => Some(*reused),
            _ => None,
        })
        .collect();
    assert_eq!(pool_events, vec![false, true]);
}

/// Missing parallel capability is reported as such
#[tokio::test]
async fn test_capability_missing() {
    let fixture = Fixture::new();
    let engine = MockEngine::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), FakePoolBackend::incapable());

    let err = orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::CapabilityMissing(_)));
    assert_eq!(engine.run_count(), 0);
}

/// Releasing the pool lets the next run start a fresh one
#[tokio::test]
async fn test_release_between_runs() {
    let fixture = Fixture::new();
    let backend = FakePoolBackend::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), backend.clone());

    orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap();
    assert!(orchestrator.context().pool_manager().release());
    assert!(!orchestrator.context().pool_manager().is_active());

    orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap();
    assert_eq!(backend.created(), 2);
}
