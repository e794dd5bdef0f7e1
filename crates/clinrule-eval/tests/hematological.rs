//! Hematological State Tests
//!
//! End-to-end evaluation of the hemoglobin state + WBC level rule from a rule file
//! on disk through the evaluator and the patient analyzer.

use clinrule_eval::{
    CachedRuleStore, EngineConfig, EvalError, FileRuleStore, FixedClock, PatientAnalyzer,
    RuleEvaluator, RuleInputs, RuleStore,
};
use clinrule_model::{AbstractedObservation, InMemoryAbstractionSource, ScalarValue, parse_timestamp};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const RULE_FILE: &str = "hematological_state.json";

fn rules_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(RULE_FILE),
        r#"{
            "input_parameters": ["hemoglobin_state", "wbc_level"],
            "rules": {
                "Severe Anemia,Low": "Critical Hematological State",
                "Severe Anemia,Normal": "Anemic State",
                "Normal Hemoglobin,Normal": "Normal Hematological State",
                "Normal Hemoglobin,High": "Leukocytosis",
                ",Low": "Leukopenia Without Hemoglobin"
            }
        }"#,
    )
    .unwrap();
    dir
}

fn inputs(hemoglobin: Option<&str>, wbc: Option<&str>) -> RuleInputs {
    let mut inputs = RuleInputs::new();
    if let Some(h) = hemoglobin {
        inputs.insert("hemoglobin_state".to_string(), ScalarValue::text(h));
    }
    if let Some(w) = wbc {
        inputs.insert("wbc_level".to_string(), ScalarValue::text(w));
    }
    inputs
}

#[rstest]
#[case(Some("Severe Anemia"), Some("Low"), Some("Critical Hematological State"))]
#[case(Some("Mild Anemia"), Some("Low"), None)]
#[case(Some("Normal Hemoglobin"), Some("High"), Some("Leukocytosis"))]
#[case(None, Some("Low"), Some("Leukopenia Without Hemoglobin"))]
#[case(Some("Severe Anemia"), None, None)]
#[case(None, None, None)]
fn test_evaluate_from_file(
    #[case] hemoglobin: Option<&str>,
    #[case] wbc: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let dir = rules_dir();
    let evaluator = RuleEvaluator::with_rules_folder(dir.path());

    let outcome = evaluator
        .evaluate(Path::new(RULE_FILE), &inputs(hemoglobin, wbc))
        .unwrap();
    assert_eq!(outcome.as_deref(), expected);
}

#[test]
fn test_evaluate_is_repeatable() {
    let dir = rules_dir();
    let evaluator = RuleEvaluator::with_rules_folder(dir.path());
    let values = inputs(Some("Severe Anemia"), Some("Low"));

    let first = evaluator.evaluate(Path::new(RULE_FILE), &values).unwrap();
    let second = evaluator.evaluate(Path::new(RULE_FILE), &values).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_evaluate_missing_rule_file() {
    let dir = rules_dir();
    let evaluator = RuleEvaluator::with_rules_folder(dir.path());

    let err = evaluator
        .evaluate(Path::new("renal_state.json"), &inputs(Some("Severe Anemia"), Some("Low")))
        .unwrap_err();
    assert!(matches!(err, EvalError::ResourceNotFound { .. }));
}

#[test]
fn test_evaluate_malformed_rule_file() {
    let dir = rules_dir();
    fs::write(dir.path().join("broken.json"), r#"{"input_parameters": ["a"]}"#).unwrap();
    let evaluator = RuleEvaluator::with_rules_folder(dir.path());

    let err = evaluator
        .evaluate(Path::new("broken.json"), &RuleInputs::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::Parse { .. }));
}

#[test]
fn test_cached_store_behind_evaluator() {
    let dir = rules_dir();
    let store = Arc::new(CachedRuleStore::new(FileRuleStore::with_rules_folder(dir.path())));
    let evaluator = RuleEvaluator::new(store.clone());
    let values = inputs(Some("Severe Anemia"), Some("Low"));

    assert!(evaluator.evaluate(Path::new(RULE_FILE), &values).unwrap().is_some());

    // Removing the file does not affect cached lookups
    fs::remove_file(dir.path().join(RULE_FILE)).unwrap();
    assert!(evaluator.evaluate(Path::new(RULE_FILE), &values).unwrap().is_some());

    store.clear_cache();
    assert!(evaluator.evaluate(Path::new(RULE_FILE), &values).is_err());
    assert!(store.load(Path::new(RULE_FILE)).is_err());
}

#[test]
fn test_analyzer_from_config() {
    let dir = rules_dir();
    let config = EngineConfig::default().with_rules_folder(dir.path());
    let day = |d: &str| parse_timestamp(d).unwrap();

    let source = InMemoryAbstractionSource::new();
    source.insert(
        "1001",
        vec![
            AbstractedObservation::new("Hemoglobin_Level", "Normal Hemoglobin", day("2024-01-01"), day("2024-01-20")),
            AbstractedObservation::new("Hemoglobin_Level", "Severe Anemia", day("2024-01-10"), day("2024-01-20")),
            AbstractedObservation::new("WBC_Level", "Low", day("2024-01-05"), day("2024-01-20")),
        ],
    );

    let analyzer = PatientAnalyzer::from_config(&config, "hematological_state", Arc::new(source))
        .unwrap()
        .with_clock(Arc::new(FixedClock(day("2024-01-12"))));

    let result = analyzer.analyze("1001", None).unwrap();
    assert_eq!(result.individual_state("hemoglobin_state"), Some("Severe Anemia"));
    assert_eq!(result.outcome.as_deref(), Some("Critical Hematological State"));

    // Before the severe reading started, the normal one applies
    let earlier = analyzer.analyze("1001", Some(day("2024-01-06"))).unwrap();
    assert_eq!(earlier.individual_state("hemoglobin_state"), Some("Normal Hemoglobin"));
    assert_eq!(earlier.outcome, None);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["hematological_state"], "Critical Hematological State");
    assert_eq!(json["individual_states"]["wbc_level"], "Low");
    assert_eq!(json["abstracted_data"].as_array().map(Vec::len), Some(3));
}
