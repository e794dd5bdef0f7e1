//! Compound clinical rule evaluation engine
//!
//! This crate derives compound clinical states from abstracted patient data using
//! declarative rule tables:
//!
//! - **Rule Store**: loads rule tables (`input_parameters` + composite-key `rules`) from JSON
//! - **Rule Evaluator**: builds the composite key from named inputs and resolves the outcome
//! - **Temporal extraction**: picks the observation valid at a snapshot instant
//! - **Patient analysis**: fetches, extracts and evaluates for one patient
//! - **Population analysis**: runs patient analysis over a roster with per-patient
//!   failure isolation
//!
//! # Example
//!
//! ```ignore
//! use clinrule_eval::{EngineConfig, PatientAnalyzer};
//! use clinrule_model::InMemoryAbstractionSource;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let source = Arc::new(InMemoryAbstractionSource::new());
//! let analyzer = PatientAnalyzer::from_config(&config, "hematological_state", source)?;
//!
//! let result = analyzer.analyze("1001", None)?;
//! println!("{:?}", result.outcome);
//! ```
//!
//! # Composite keys
//!
//! A rule table with `input_parameters = ["hemoglobin_state", "wbc_level"]` is indexed by
//! keys such as `"Severe Anemia,Low"`. Inputs that are missing or null contribute an empty
//! field, so `{"wbc_level": "Low"}` produces the key `",Low"`.

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod population;
pub mod result;
pub mod rule;
pub mod store;
pub mod temporal;

// Re-export main types
pub use analyzer::PatientAnalyzer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CompoundRule, ConceptBinding, EngineConfig, RULES_PATH_ENV};
pub use error::{EvalError, EvalResult};
pub use evaluator::{RuleEvaluator, RuleInputs};
pub use population::{BatchSummary, PatientFailure, PatientOutcome, PopulationAnalyzer};
pub use result::{AnalysisResult, NO_DATA_MESSAGE, RESERVED_FIELDS};
pub use rule::{KEY_DELIMITER, RuleDefinition};
pub use store::{CachedRuleStore, FileRuleStore, RuleStore};
pub use temporal::{latest_observation, latest_value};
