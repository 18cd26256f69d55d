//! YAML pipeline loading and end-to-end runs over CSV files.


use dagprep_cli::{load_pipeline, parse_pipeline, PipelineError};
use dagprep_core::config::EngineConfig;
use dagprep_core::error::Error;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::Scalar;
use dagprep_exec::{Engine, RunStatus};
use dagprep_io::readers::{MemorySource, RoutedSource};
use dagprep_io::writers::JsonlWriter;
use test_data_gen::*;

#[test]
fn test_parse_pipeline_from_memory() {
    let yaml = r#"
config:
  impute_neighbors: 3
sources:
  - name: people
    locator: memory://people
  - name: scores
    locator: memory://scores
    label: Exam scores
steps:
  - name: joined
    op: merge
    inputs: [people, scores]
    reference_columns: [[id], [id]]
"#;
    let parsed = parse_pipeline(yaml, &memory_source()).unwrap();
    assert_eq!(parsed.config.impute_neighbors, Some(3));

    let people = parsed.node("people").unwrap();
    let scores = parsed.node("scores").unwrap();
    let joined = parsed.node("joined").unwrap();
    assert_eq!(parsed.name_of(joined), Some("joined"));

    let g = &parsed.graph;
    assert_eq!(g.node(scores).unwrap().label, "Exam scores");
    assert_eq!(g.node(people).unwrap().label, "Raw data file 1");
    assert_eq!(g.node(joined).unwrap().transform(), Some(TransformKind::Merge));
    assert_eq!(g.immediate_predecessors(joined).unwrap(), &[people, scores]);

    let mut engine = Engine::new(EngineConfig::default(), memory_source());
    engine.run_pipeline(g).unwrap();
    assert_eq!(engine.get_dataset(joined).unwrap().num_rows(), 1);
}

#[test]
fn test_duplicate_source_locator_is_rejected() {
    let yaml = r#"
sources:
  - name: a
    locator: memory://people
  - name: b
    locator: memory://people
"#;
    let err = parse_pipeline(yaml, &memory_source()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Graph { ref name, source: Error::DuplicateSource(_) } if name == "b"
    ));
}

#[test]
fn test_wrong_arity_is_rejected() {
    let yaml = r#"
sources:
  - name: a
    locator: memory://people
steps:
  - name: m
    op: merge
    inputs: [a]
"#;
    let err = parse_pipeline(yaml, &memory_source()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Graph { source: Error::ArityMismatch { expected: 2, got: 1, .. }, .. }
    ));
}

#[test]
fn test_missing_source_without_columns_fails_to_parse() {
    let yaml = r#"
sources:
  - name: a
    locator: memory://nowhere
"#;
    let err = parse_pipeline(yaml, &MemorySource::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Source { ref name, .. } if name == "a"));
}

#[test]
fn test_csv_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "people.csv", "id,name\n1,a\n2,b\n2,b\n");
    write_csv(dir.path(), "scores.csv", "id,score\n1,90\n3,70\n");
    write_csv(dir.path(), "readings.csv", "t,v\n1,10\n2,\n3,30\n");
    let pipeline = dir.path().join("pipeline.yaml");
    std::fs::write(
        &pipeline,
        r#"
config:
  impute_neighbors: 2
sources:
  - name: people
    locator: people.csv
  - name: scores
    locator: scores.csv
  - name: readings
    locator: readings.csv
steps:
  - name: unique_people
    op: deduplicate
    inputs: [people]
  - name: joined
    op: merge
    inputs: [unique_people, scores]
    reference_columns: [[id], [id]]
  - name: filled
    op: impute
    inputs: [readings]
    reference_columns: [[v]]
"#,
    )
    .unwrap();

    let reader = RoutedSource::new();
    let parsed = load_pipeline(&pipeline, &reader).unwrap();
    let mut cfg = EngineConfig::default();
    cfg.merge(&parsed.config);
    assert_eq!(cfg.impute_neighbors, 2);

    let mut engine = Engine::new(cfg, reader);
    let run = engine.run_pipeline(&parsed.graph).unwrap();
    assert_eq!(run.status(), &RunStatus::Completed);
    assert_eq!(run.steps().len(), 3);

    let unique = engine.get_dataset(parsed.node("unique_people").unwrap()).unwrap();
    assert_eq!(unique.num_rows(), 2);

    let joined = engine.get_dataset(parsed.node("joined").unwrap()).unwrap();
    assert_eq!(joined.column_names(), strs(&["id", "name", "score"]));
    assert_eq!(
        joined.row(0),
        vec![Scalar::I64(1), Scalar::from("a"), Scalar::I64(90)]
    );

    let filled = engine.get_dataset(parsed.node("filled").unwrap()).unwrap();
    assert_eq!(filled.column("v").unwrap().values[1], Scalar::F64(20.0));

    let mut out = JsonlWriter::to_writer(Vec::new());
    out.write_dataset(joined).unwrap();
    let text = String::from_utf8(out.into_inner().unwrap()).unwrap();
    assert_eq!(text.trim(), r#"{"id":1,"name":"a","score":90}"#);
}
