//! Test: Diet file resolution

use crate::helpers::*;
use mgpipe::core::{DietSpec, FileRole, PipelineError};

/// "MyDiet" resolves to MyDiet.txt
#[test]
fn test_diet_extension_appended() {
    let fixture = Fixture::new();
    fixture.write("MyDiet.txt", "EX_fru(e)\t-5\n");
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let prepared = orchestrator
        .prepare(fixture.required(), fixture.optional().with_diet("MyDiet"))
        .unwrap();

    match prepared.diet {
        DietSpec::Shared(path) => assert!(path.ends_with("MyDiet.txt")),
        other => panic!("Expected shared diet, got {:?}", other),
    }
}

/// A diet that does not exist fails with MissingFile
#[test]
fn test_missing_diet() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let err = orchestrator
        .prepare(fixture.required(), fixture.optional().with_diet("Missing"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingFile { role: FileRole::Diet, .. }));
}

/// Per-individual diets must match the number of samples
#[test]
fn test_per_individual_diet_count() {
    let fixture = Fixture::new();
    fixture.write("ind1.txt", "EX_glc_D(e)\t-10\n");
    fixture.write("ind2.txt", "EX_glc_D(e)\t-8\n");
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let prepared = orchestrator
        .prepare(
            fixture.required(),
            fixture.optional().with_per_individual_diets(["ind1", "ind2"]),
        )
        .unwrap();
    assert!(prepared.diet.is_personalized());

    let err = orchestrator
        .prepare(
            fixture.required(),
            fixture.optional().with_per_individual_diets(["ind1"]),
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation { field: "dietFilePath", .. }));
}

/// A named but missing stratification file is an error, not a warning
#[test]
fn test_missing_info_file() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let err = orchestrator
        .prepare(fixture.required(), fixture.optional().with_info_file("groups.csv"))
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingFile { role: FileRole::Info, .. }));

    fixture.write("groups.csv", "ID,Group\nS1,healthy\nS2,disease\n");
    let prepared = orchestrator
        .prepare(fixture.required(), fixture.optional().with_info_file("groups.csv"))
        .unwrap();
    assert!(prepared.stratified);
    assert!(prepared.config.has_stratification());
}
