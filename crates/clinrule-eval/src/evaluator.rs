//! Rule evaluation
//!
//! The evaluator joins input values into a composite key in the declared parameter
//! order and looks the key up in the rule table. There is no partial or fuzzy matching.

use crate::error::EvalResult;
use crate::rule::{KEY_DELIMITER, RuleDefinition};
use crate::store::{FileRuleStore, RuleStore};
use clinrule_model::ScalarValue;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Named input values for a rule
pub type RuleInputs = IndexMap<String, ScalarValue>;

/// Evaluates rule tables loaded through a [`RuleStore`]
#[derive(Clone)]
pub struct RuleEvaluator {
    store: Arc<dyn RuleStore>,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(FileRuleStore::new()))
    }
}

impl RuleEvaluator {
    /// Create an evaluator over a rule store
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Create an evaluator reading rule files relative to `rules_folder`
    pub fn with_rules_folder(rules_folder: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileRuleStore::with_rules_folder(rules_folder)))
    }

    /// Get the rule store
    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Load the rule at `location` and evaluate it against `inputs`.
    ///
    /// Returns `Ok(None)` when no rule key matches. Load and parse failures propagate.
    pub fn evaluate(&self, location: &Path, inputs: &RuleInputs) -> EvalResult<Option<String>> {
        let definition = self.store.load(location)?;
        let outcome = Self::evaluate_definition(&definition, inputs);

        if outcome.is_none() {
            log::debug!("No rule in {} matched", location.display());
        }

        Ok(outcome)
    }

    /// Evaluate an already loaded definition
    pub fn evaluate_definition(definition: &RuleDefinition, inputs: &RuleInputs) -> Option<String> {
        let key = Self::composite_key(definition, inputs);
        definition.lookup(&key).map(str::to_string)
    }

    /// Build the composite key for `inputs`.
    ///
    /// Each declared parameter contributes one field, in declaration order. A missing or
    /// null input contributes an empty field. Values containing the delimiter are used
    /// verbatim and shift the key's field boundaries.
    pub fn composite_key(definition: &RuleDefinition, inputs: &RuleInputs) -> String {
        let fields: Vec<String> = definition
            .input_parameters
            .iter()
            .map(|param| {
                let field = inputs.get(param).map(ScalarValue::key_field).unwrap_or_default();
                if field.contains(KEY_DELIMITER) {
                    log::warn!(
                        "Value '{}' for parameter '{}' contains the key delimiter '{}'",
                        field,
                        param,
                        KEY_DELIMITER
                    );
                }
                field
            })
            .collect();

        let key = fields.join(KEY_DELIMITER);
        log::debug!("Composite rule key: '{}'", key);
        key
    }
}
