//! Single-patient analysis
//!
//! Fetches a patient's abstracted data, extracts each required individual state valid at
//! the snapshot instant, and evaluates the compound rule over them.

use crate::clock::{Clock, SystemClock};
use crate::config::{CompoundRule, EngineConfig};
use crate::error::EvalResult;
use crate::evaluator::{RuleEvaluator, RuleInputs};
use crate::result::AnalysisResult;
use crate::temporal::latest_value;
use chrono::NaiveDateTime;
use clinrule_model::{AbstractionSource, ScalarValue};
use indexmap::IndexMap;
use std::sync::Arc;

/// Derives one compound state for individual patients
pub struct PatientAnalyzer {
    evaluator: RuleEvaluator,
    abstraction: Arc<dyn AbstractionSource>,
    clock: Arc<dyn Clock>,
    rule: CompoundRule,
    include_abstracted_data: bool,
}

impl PatientAnalyzer {
    /// Create an analyzer for `rule`
    pub fn new(
        evaluator: RuleEvaluator,
        abstraction: Arc<dyn AbstractionSource>,
        rule: CompoundRule,
    ) -> Self {
        Self {
            evaluator,
            abstraction,
            clock: Arc::new(SystemClock),
            rule,
            include_abstracted_data: true,
        }
    }

    /// Create an analyzer for the compound rule named `rule_name` in `config`
    pub fn from_config(
        config: &EngineConfig,
        rule_name: &str,
        abstraction: Arc<dyn AbstractionSource>,
    ) -> EvalResult<Self> {
        let rule = config.compound_rule(rule_name)?.clone();
        let evaluator = RuleEvaluator::new(config.rule_store());

        Ok(Self::new(evaluator, abstraction, rule)
            .with_abstracted_data(config.include_abstracted_data))
    }

    /// Use `clock` for the default snapshot instant
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach raw observations to results
    pub fn with_abstracted_data(mut self, include: bool) -> Self {
        self.include_abstracted_data = include;
        self
    }

    /// Get the compound rule
    pub fn rule(&self) -> &CompoundRule {
        &self.rule
    }

    /// Current instant according to the analyzer's clock
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Analyze one patient at `snapshot` (defaults to now).
    ///
    /// A patient without abstracted data yields a no-data result rather than an error.
    /// Rule load failures and source failures propagate.
    pub fn analyze(
        &self,
        patient_id: &str,
        snapshot: Option<NaiveDateTime>,
    ) -> EvalResult<AnalysisResult> {
        let patient_id = patient_id.trim();
        let snapshot = snapshot.unwrap_or_else(|| self.clock.now());

        let observations = self.abstraction.fetch_abstracted(patient_id, snapshot)?;

        if observations.is_empty() {
            log::debug!("No abstracted data for patient {}", patient_id);
            return Ok(AnalysisResult::no_data(
                patient_id,
                snapshot,
                &self.rule.name,
                self.rule.inputs.iter().map(|b| b.parameter.as_str()),
            ));
        }

        let individual_states: IndexMap<String, Option<String>> = self
            .rule
            .inputs
            .iter()
            .map(|binding| {
                let value = latest_value(&observations, &binding.concept, snapshot);
                (binding.parameter.clone(), value.map(str::to_string))
            })
            .collect();

        let outcome = if individual_states
            .values()
            .all(|state| state.as_deref().is_some_and(|s| !s.is_empty()))
        {
            let inputs: RuleInputs = individual_states
                .iter()
                .map(|(param, state)| (param.clone(), ScalarValue::from(state.clone())))
                .collect();
            self.evaluator.evaluate(&self.rule.rule_path, &inputs)?
        } else {
            log::debug!(
                "Patient {} is missing individual states for {}",
                patient_id,
                self.rule.name
            );
            None
        };

        Ok(AnalysisResult {
            patient_id: patient_id.to_string(),
            snapshot_date: snapshot,
            individual_states,
            outcome_name: self.rule.name.clone(),
            outcome,
            error: None,
            abstracted_data: self.include_abstracted_data.then_some(observations),
            first_name: None,
            last_name: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::EvalError;
    use crate::rule::RuleDefinition;
    use crate::store::RuleStore;
    use clinrule_model::{AbstractedObservation, InMemoryAbstractionSource, parse_timestamp};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    /// Rule store serving one fixed definition and counting loads
    struct StaticRuleStore {
        definition: RuleDefinition,
        loads: Mutex<usize>,
    }

    impl RuleStore for StaticRuleStore {
        fn load(&self, _location: &Path) -> EvalResult<RuleDefinition> {
            *self.loads.lock() += 1;
            Ok(self.definition.clone())
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn store() -> Arc<StaticRuleStore> {
        Arc::new(StaticRuleStore {
            definition: RuleDefinition::new(vec!["hemoglobin_state".into(), "wbc_level".into()])
                .with_rule("Severe Anemia,Low", "Critical Hematological State"),
            loads: Mutex::new(0),
        })
    }

    fn analyzer(store: Arc<StaticRuleStore>, source: InMemoryAbstractionSource) -> PatientAnalyzer {
        PatientAnalyzer::new(
            RuleEvaluator::new(store),
            Arc::new(source),
            CompoundRule::hematological(),
        )
        .with_clock(Arc::new(FixedClock(ts("2024-01-05 12:00:00"))))
    }

    fn observation(concept: &str, value: &str) -> AbstractedObservation {
        AbstractedObservation::new(concept, value, ts("2024-01-01"), ts("2024-01-10"))
    }

    #[test]
    fn test_compound_state() {
        let source = InMemoryAbstractionSource::new();
        source.insert(
            "1001",
            vec![
                observation("Hemoglobin_Level", "Severe Anemia"),
                observation("WBC_Level", "Low"),
            ],
        );

        let result = analyzer(store(), source).analyze(" 1001 ", None).unwrap();

        assert_eq!(result.patient_id, "1001");
        assert_eq!(result.snapshot_date, ts("2024-01-05 12:00:00"));
        assert_eq!(result.individual_state("hemoglobin_state"), Some("Severe Anemia"));
        assert_eq!(result.individual_state("wbc_level"), Some("Low"));
        assert_eq!(result.outcome.as_deref(), Some("Critical Hematological State"));
        assert_eq!(result.error, None);
        assert_eq!(result.abstracted_data.map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let source = InMemoryAbstractionSource::new();
        source.insert(
            "1001",
            vec![
                observation("Hemoglobin_Level", "Mild Anemia"),
                observation("WBC_Level", "Low"),
            ],
        );

        let result = analyzer(store(), source).analyze("1001", None).unwrap();
        assert_eq!(result.outcome, None);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_no_data() {
        let rules = store();
        let result = analyzer(rules.clone(), InMemoryAbstractionSource::new())
            .analyze("1001", Some(ts("2024-01-03")))
            .unwrap();

        assert!(result.is_no_data());
        assert_eq!(result.outcome, None);
        assert_eq!(result.snapshot_date, ts("2024-01-03"));
        assert_eq!(result.individual_state("hemoglobin_state"), None);
        assert_eq!(*rules.loads.lock(), 0);
    }

    #[test]
    fn test_missing_individual_state_skips_evaluation() {
        let source = InMemoryAbstractionSource::new();
        source.insert("1001", vec![observation("WBC_Level", "Low")]);

        let rules = store();
        let result = analyzer(rules.clone(), source).analyze("1001", None).unwrap();

        assert!(!result.is_no_data());
        assert_eq!(result.individual_state("hemoglobin_state"), None);
        assert_eq!(result.individual_state("wbc_level"), Some("Low"));
        assert_eq!(result.outcome, None);
        assert_eq!(*rules.loads.lock(), 0);
    }

    #[test]
    fn test_empty_individual_state_skips_evaluation() {
        let source = InMemoryAbstractionSource::new();
        source.insert(
            "1001",
            vec![observation("Hemoglobin_Level", ""), observation("WBC_Level", "Low")],
        );

        let rules = store();
        let result = analyzer(rules.clone(), source).analyze("1001", None).unwrap();

        assert_eq!(result.individual_state("hemoglobin_state"), Some(""));
        assert_eq!(result.outcome, None);
        assert_eq!(*rules.loads.lock(), 0);
    }

    #[test]
    fn test_snapshot_outside_validity() {
        let source = InMemoryAbstractionSource::new();
        source.insert(
            "1001",
            vec![
                observation("Hemoglobin_Level", "Severe Anemia"),
                observation("WBC_Level", "Low"),
            ],
        );

        let result = analyzer(store(), source)
            .analyze("1001", Some(ts("2024-02-01")))
            .unwrap();

        assert!(!result.is_no_data());
        assert_eq!(result.individual_state("wbc_level"), None);
        assert_eq!(result.outcome, None);
    }

    #[test]
    fn test_abstracted_data_can_be_omitted() {
        let source = InMemoryAbstractionSource::new();
        source.insert("1001", vec![observation("WBC_Level", "Low")]);

        let result = analyzer(store(), source)
            .with_abstracted_data(false)
            .analyze("1001", None)
            .unwrap();
        assert_eq!(result.abstracted_data, None);
    }

    #[test]
    fn test_rule_errors_propagate() {
        struct MissingStore;

        impl RuleStore for MissingStore {
            fn load(&self, location: &Path) -> EvalResult<RuleDefinition> {
                Err(EvalError::resource_not_found(location.display().to_string()))
            }
        }

        let source = InMemoryAbstractionSource::new();
        source.insert(
            "1001",
            vec![
                observation("Hemoglobin_Level", "Severe Anemia"),
                observation("WBC_Level", "Low"),
            ],
        );

        let analyzer = PatientAnalyzer::new(
            RuleEvaluator::new(Arc::new(MissingStore)),
            Arc::new(source),
            CompoundRule::hematological(),
        );

        assert!(matches!(
            analyzer.analyze("1001", None),
            Err(EvalError::ResourceNotFound { .. })
        ));
    }
}
