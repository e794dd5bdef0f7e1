//! Compound clinical state derivation for Rust
//!
//! This crate combines:
//! - The abstracted observation model and data source traits (`model`)
//! - The rule store, rule evaluator and patient/population analyzers (`eval`)
//! - The `clinrule` command-line tool (feature `cli`)
//!
//! # Example
//!
//! ```ignore
//! use clinrule::{RuleEvaluator, RuleInputs, ScalarValue};
//! use std::path::Path;
//!
//! let evaluator = RuleEvaluator::with_rules_folder("rules");
//! let mut inputs = RuleInputs::new();
//! inputs.insert("hemoglobin_state".into(), ScalarValue::text("Severe Anemia"));
//! inputs.insert("wbc_level".into(), ScalarValue::text("Low"));
//!
//! let outcome = evaluator.evaluate(Path::new("hematological_state.json"), &inputs)?;
//! ```

// Re-export all public APIs from internal crates
pub use clinrule_eval as eval;
pub use clinrule_model as model;

// Convenience re-exports
pub use clinrule_eval::{
    AnalysisResult, EngineConfig, EvalError, EvalResult, PatientAnalyzer, PatientOutcome,
    PopulationAnalyzer, RuleDefinition, RuleEvaluator, RuleInputs,
};
pub use clinrule_model::{AbstractedObservation, ScalarValue};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
