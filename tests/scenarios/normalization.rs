//! Test: Abundance normalization gate

use crate::helpers::*;
use mgpipe::core::PipelineError;

/// Columns summing to 1.00 and 0.995 pass and the engine runs
#[tokio::test]
async fn test_normalized_table_runs() {
    let fixture = Fixture::new();
    let engine = MockEngine::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), FakePoolBackend::new());

    let outcome = orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap();

    assert!(outcome.result.models_ok);
    assert_eq!(engine.run_count(), 1);
}

/// A column summing to 1.05 aborts before the engine is called
#[tokio::test]
async fn test_unnormalized_table_aborts() {
    let fixture = Fixture::new();
    fixture.write_abundance(&[
        ("Bacteroides", vec![0.5, 0.7]),
        ("Prevotella", vec![0.5, 0.35]),
    ]);
    let engine = MockEngine::new();
    let backend = FakePoolBackend::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), backend.clone());

    let err = orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap_err();

    match err {
        PipelineError::NotNormalized { columns, .. } => {
            assert_eq!(columns.len(), 1);
            assert_eq!(columns[0].sample, "S2");
        }
        other => panic!("Expected NotNormalized, got {:?}", other),
    }
    assert_eq!(engine.run_count(), 0);
    assert_eq!(backend.created(), 0, "No pool may be started for invalid input");
}

/// A looser tolerance from the parameters is honored
#[tokio::test]
async fn test_tolerance_override() {
    let fixture = Fixture::new();
    fixture.write_abundance(&[("Bacteroides", vec![1.04]), ("Prevotella", vec![0.01])]);
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let result = orchestrator
        .execute(
            fixture.required(),
            fixture.optional().with_normalization_tolerance(1.1),
        )
        .await;
    assert!(result.is_ok());
}

/// Empty and non-numeric cells do not break parsing
#[tokio::test]
async fn test_sparse_table_accepted() {
    let fixture = Fixture::new();
    fixture.write("abundance.csv", "ID,S1,S2\nBacteroides,0.5,NA\nPrevotella,,0.9\n");
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let outcome = orchestrator
        .execute(fixture.required(), fixture.optional())
        .await;
    assert!(outcome.is_ok());
}
