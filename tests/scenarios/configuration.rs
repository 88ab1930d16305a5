//! Test: Parameter resolution seen through a full run

use crate::helpers::*;
use mgpipe::core::config::{DEFAULT_OBJECTIVE, DEFAULT_RESULT_DIR};
use mgpipe::core::{OptionalParams, PipelineError};
use mgpipe::execution::PipelineEvent;
use std::path::MAIN_SEPARATOR_STR;

/// Unspecified objective falls back to EX_biomass(e) with a notice
#[tokio::test]
async fn test_objective_defaulted() {
    let fixture = Fixture::new();
    let engine = MockEngine::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), FakePoolBackend::new());
    let events = record_events(&orchestrator);

    let outcome = orchestrator
        .execute(fixture.required(), fixture.optional())
        .await
        .unwrap();

    assert_eq!(outcome.config.objre(), vec![DEFAULT_OBJECTIVE.to_string()]);
    assert!(events.lock().unwrap().iter().any(|e| matches!(
        e,
        PipelineEvent::ObjectiveDefaulted { objective } if objective == DEFAULT_OBJECTIVE
    )));

    let request = engine.last_request().unwrap();
    assert_eq!(request["config"]["objre"][0], DEFAULT_OBJECTIVE);
}

/// Result path without a trailing separator gets one, and the directory exists
#[test]
fn test_result_path_trailing_separator() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());
    let out = fixture.path("deep").join("out");

    let prepared = orchestrator
        .prepare(
            fixture.required(),
            OptionalParams::new().with_result_path(&out),
        )
        .unwrap();

    assert!(out.is_dir());
    assert_eq!(
        prepared.config.result_path().to_string_lossy(),
        format!("{}{}", out.display(), MAIN_SEPARATOR_STR)
    );
}

/// Default result directory lands under the base directory
#[test]
fn test_default_result_dir() {
    let fixture = Fixture::new();
    let orchestrator = orchestrator(&fixture, MockEngine::new(), FakePoolBackend::new());

    let prepared = orchestrator
        .prepare(fixture.required(), OptionalParams::new())
        .unwrap();

    assert!(fixture.path(DEFAULT_RESULT_DIR).is_dir());
    assert!(prepared.config.result_path().starts_with(fixture.root()));
}

/// YAML parameters are merged under explicit overrides
#[tokio::test]
async fn test_yaml_parameters() {
    let fixture = Fixture::new();
    fixture.write("HighFiber.txt", "EX_pect(e)\t-1\n");
    let yaml = fixture.write(
        "params.yaml",
        r#"
dietFilePath: "HighFiber"
numWorkers: 3
objre:
  - "EX_but(e)"
saveConstrModels: true
"#,
    );
    let engine = MockEngine::new();
    let orchestrator = orchestrator(&fixture, engine.clone(), FakePoolBackend::new());

    let optional = OptionalParams::from_file(&yaml)
        .unwrap()
        .merge(fixture.optional().with_num_workers(5));
    let outcome = orchestrator.execute(fixture.required(), optional).await.unwrap();

    assert_eq!(outcome.config.num_workers(), 5);
    assert!(outcome.config.save_constr_models());
    assert_eq!(outcome.config.objre(), vec!["EX_but(e)".to_string()]);
    assert!(!outcome.config.objective_defaulted());

    let request = engine.last_request().unwrap();
    assert_eq!(request["numWorkers"], 5);
    assert_eq!(request["config"]["saveConstrModels"], true);
    assert!(request["diet"]["paths"]
        .as_str()
        .unwrap()
        .ends_with("HighFiber.txt"));
}

/// Bad parameter types never reach the engine
#[test]
fn test_invalid_yaml_type() {
    let err = OptionalParams::from_yaml("numWorkers: many").unwrap_err();
    assert!(matches!(err, PipelineError::ConfigFile(_)));
}
