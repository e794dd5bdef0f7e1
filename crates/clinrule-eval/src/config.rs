//! Engine configuration
//!
//! Everything the analyzers need to locate rules and data is carried in an explicit
//! [`EngineConfig`]. The defaults describe the hematological state rule
//! (hemoglobin state + WBC level).

use crate::error::{EvalError, EvalResult};
use crate::result::RESERVED_FIELDS;
use crate::store::{CachedRuleStore, FileRuleStore, RuleStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding [`EngineConfig::rules_folder`]
pub const RULES_PATH_ENV: &str = "CLINRULE_RULES_PATH";

/// Binds a rule input parameter to the abstraction concept that supplies it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptBinding {
    /// Parameter name as listed in the rule's `input_parameters`
    pub parameter: String,
    /// Concept name in the abstracted data
    pub concept: String,
}

impl ConceptBinding {
    pub fn new(parameter: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            concept: concept.into(),
        }
    }
}

/// A compound state derived by one rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundRule {
    /// Name of the derived state (e.g. `hematological_state`)
    pub name: String,
    /// Rule resource location, relative to the rules folder unless absolute
    pub rule_path: PathBuf,
    /// Required inputs, in reporting order
    pub inputs: Vec<ConceptBinding>,
}

impl CompoundRule {
    pub fn new(name: impl Into<String>, rule_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            rule_path: rule_path.into(),
            inputs: Vec::new(),
        }
    }

    /// Add a required input
    pub fn with_input(mut self, parameter: impl Into<String>, concept: impl Into<String>) -> Self {
        self.inputs.push(ConceptBinding::new(parameter, concept));
        self
    }

    /// The hemoglobin state + WBC level rule
    pub fn hematological() -> Self {
        Self::new("hematological_state", "hematological_state.json")
            .with_input("hemoglobin_state", "Hemoglobin_Level")
            .with_input("wbc_level", "WBC_Level")
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Folder that relative rule paths resolve against
    pub rules_folder: Option<PathBuf>,
    /// Query handed to the data-access source to list all patients
    pub roster_query: String,
    /// Known compound rules
    pub compound_rules: Vec<CompoundRule>,
    /// Attach the raw abstracted observations to each analysis result
    pub include_abstracted_data: bool,
    /// Keep rule definitions after their first load
    pub cache_rules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_folder: Some(PathBuf::from("rules")),
            roster_query: "get_all_patients".to_string(),
            compound_rules: vec![CompoundRule::hematological()],
            include_abstracted_data: true,
            cache_rules: false,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> EvalResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EvalError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            EvalError::invalid_config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(folder) = std::env::var(RULES_PATH_ENV) {
            if !folder.is_empty() {
                self.rules_folder = Some(PathBuf::from(folder));
            }
        }
        self
    }

    /// Set the rules folder
    pub fn with_rules_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.rules_folder = Some(folder.into());
        self
    }

    /// Check structural consistency
    pub fn validate(&self) -> EvalResult<()> {
        if self.compound_rules.is_empty() {
            return Err(EvalError::invalid_config("no compound rules configured"));
        }

        let mut names = HashSet::new();
        for rule in &self.compound_rules {
            if RESERVED_FIELDS.contains(&rule.name.as_str()) {
                return Err(EvalError::invalid_config(format!(
                    "compound rule name '{}' clashes with a result field",
                    rule.name
                )));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(EvalError::invalid_config(format!(
                    "duplicate compound rule '{}'",
                    rule.name
                )));
            }
            if rule.inputs.is_empty() {
                return Err(EvalError::invalid_config(format!(
                    "compound rule '{}' has no inputs",
                    rule.name
                )));
            }
        }

        Ok(())
    }

    /// Find a compound rule by name
    pub fn compound_rule(&self, name: &str) -> EvalResult<&CompoundRule> {
        self.compound_rules
            .iter()
            .find(|rule| rule.name == name)
            .ok_or_else(|| EvalError::undefined_rule(name))
    }

    /// Build the rule store this configuration describes
    pub fn rule_store(&self) -> Arc<dyn RuleStore> {
        let store = match &self.rules_folder {
            Some(folder) => FileRuleStore::with_rules_folder(folder),
            None => FileRuleStore::new(),
        };

        if self.cache_rules {
            Arc::new(CachedRuleStore::new(store))
        } else {
            Arc::new(store)
        }
    }
}
