//! Rule definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between fields of a composite key
pub const KEY_DELIMITER: &str = ",";

/// A declarative rule table
///
/// `input_parameters` fixes the order in which input values are joined into a composite
/// key; `rules` maps each composite key to its outcome. Keys are kept exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub input_parameters: Vec<String>,
    pub rules: IndexMap<String, String>,
}

impl RuleDefinition {
    pub fn new(input_parameters: Vec<String>) -> Self {
        Self {
            input_parameters,
            rules: IndexMap::new(),
        }
    }

    /// Add a rule entry
    pub fn with_rule(mut self, key: impl Into<String>, outcome: impl Into<String>) -> Self {
        self.rules.insert(key.into(), outcome.into());
        self
    }

    /// Parse a definition from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Outcome mapped to `key`, if any
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.rules.get(key).map(String::as_str)
    }

    /// Number of fields a matchable key has
    pub fn arity(&self) -> usize {
        self.input_parameters.len()
    }

    /// Keys whose field count differs from the parameter count.
    ///
    /// Such entries can never match; evaluation ignores them silently.
    pub fn arity_mismatches(&self) -> Vec<&str> {
        self.rules
            .keys()
            .filter(|key| key.split(KEY_DELIMITER).count() != self.arity())
            .map(String::as_str)
            .collect()
    }
}
