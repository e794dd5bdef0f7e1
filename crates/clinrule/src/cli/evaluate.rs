//! Evaluate command implementation

use super::output::{self, OutputFormat, Tabular};
use anyhow::{Context, Result};
use clinrule_eval::{RuleEvaluator, RuleInputs};
use clinrule_model::ScalarValue;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for evaluate command
pub struct EvaluateConfig {
    pub rule: PathBuf,
    pub inputs: Vec<String>,
    pub rules_folder: Option<PathBuf>,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

/// Result of a single rule evaluation
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub rule: String,
    pub key: String,
    pub outcome: Option<String>,
}

impl Tabular for EvaluationReport {
    fn to_table(&self) -> String {
        output::key_value_table([
            ("rule", self.rule.clone()),
            ("key", self.key.clone()),
            ("outcome", self.outcome.clone().unwrap_or_else(|| "null".to_string())),
        ])
    }
}

/// Evaluate a rule file against command-line inputs
pub fn evaluate(config: EvaluateConfig) -> Result<()> {
    let inputs = parse_inputs(&config.inputs)?;

    let evaluator = match &config.rules_folder {
        Some(folder) => RuleEvaluator::with_rules_folder(folder),
        None => RuleEvaluator::default(),
    };

    let definition = evaluator
        .store()
        .load(&config.rule)
        .with_context(|| format!("Failed to load rule: {}", config.rule.display()))?;

    let key = RuleEvaluator::composite_key(&definition, &inputs);
    let outcome = RuleEvaluator::evaluate_definition(&definition, &inputs);

    if outcome.is_none() {
        log::info!("No rule entry for key '{}'", key);
    }

    let report = EvaluationReport {
        rule: config.rule.display().to_string(),
        key,
        outcome,
    };

    let format = OutputFormat::parse(config.output_format.as_deref().unwrap_or("pretty"));
    output::print_output(&report, format, config.output_file.as_deref())
}

/// Parse input strings (name=value) into rule inputs.
///
/// Values stay text as typed, since rule keys are matched verbatim. Only `null` is
/// special and becomes an empty key field.
pub fn parse_inputs(inputs: &[String]) -> Result<RuleInputs> {
    let mut result = RuleInputs::new();

    for input in inputs {
        let Some((name, value_str)) = input.split_once('=') else {
            anyhow::bail!("Invalid input format: '{}'. Expected 'name=value'", input);
        };

        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid input format: '{}'. Parameter name is empty", input);
        }

        result.insert(name.to_string(), parse_scalar(value_str.trim()));
    }

    Ok(result)
}

fn parse_scalar(value_str: &str) -> ScalarValue {
    if value_str == "null" {
        ScalarValue::Null
    } else {
        ScalarValue::text(value_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinrule_eval::RuleDefinition;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_inputs() {
        let inputs = vec![
            "hemoglobin_state=Severe Anemia".to_string(),
            "wbc_level = Low".to_string(),
            "missing=null".to_string(),
        ];

        let result = parse_inputs(&inputs).unwrap();

        assert_eq!(result.get("hemoglobin_state"), Some(&ScalarValue::text("Severe Anemia")));
        assert_eq!(result.get("wbc_level"), Some(&ScalarValue::text("Low")));
        assert_eq!(result.get("missing"), Some(&ScalarValue::Null));
    }

    #[rstest]
    #[case("007")]
    #[case("1.0")]
    #[case("1e3")]
    #[case("Infinity")]
    #[case("true")]
    #[case("-0")]
    fn test_parse_inputs_keeps_values_as_typed(#[case] value: &str) {
        let result = parse_inputs(&[format!("x={}", value)]).unwrap();
        assert_eq!(result.get("x"), Some(&ScalarValue::text(value)));
        assert_eq!(result["x"].key_field(), value);
    }

    #[test]
    fn test_numeric_looking_inputs_match_verbatim_keys() {
        let definition =
            RuleDefinition::new(vec!["code".to_string(), "ratio".to_string()])
                .with_rule("007,1.0", "Matched");
        let inputs = parse_inputs(&["code=007".to_string(), "ratio=1.0".to_string()]).unwrap();

        assert_eq!(RuleEvaluator::composite_key(&definition, &inputs), "007,1.0");
        assert_eq!(
            RuleEvaluator::evaluate_definition(&definition, &inputs),
            Some("Matched".to_string())
        );
    }

    #[test]
    fn test_parse_inputs_keeps_value_equals_signs() {
        let result = parse_inputs(&["note=a=b".to_string()]).unwrap();
        assert_eq!(result.get("note"), Some(&ScalarValue::text("a=b")));
    }

    #[test]
    fn test_parse_inputs_invalid() {
        assert!(parse_inputs(&["invalid".to_string()]).is_err());
        assert!(parse_inputs(&["=Low".to_string()]).is_err());
    }
}
