//! Validate command implementation
//!
//! Reports rule entries that can never match because their key has the wrong number
//! of fields. Evaluation itself never rejects such entries.

use super::output;
use anyhow::{Context, Result};
use clinrule_eval::{FileRuleStore, RuleStore};
use std::path::{Path, PathBuf};

/// Configuration for validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    pub rules_folder: Option<PathBuf>,
    pub strict: bool,
}

/// Validation findings for one rule file
#[derive(Debug)]
pub struct ValidationReport {
    pub rule: String,
    pub input_parameters: Vec<String>,
    pub entries: usize,
    pub arity_mismatches: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.arity_mismatches.is_empty()
    }
}

/// Validate rule files
pub fn validate(config: ValidateConfig) -> Result<()> {
    let store = match &config.rules_folder {
        Some(folder) => FileRuleStore::with_rules_folder(folder),
        None => FileRuleStore::new(),
    };

    let mut mismatched_files = 0;

    for file in &config.files {
        let report = validate_file(&store, file)?;

        if report.is_clean() {
            eprintln!(
                "{}",
                output::format_success(&format!(
                    "{}: {} entries over {} parameters",
                    report.rule,
                    report.entries,
                    report.input_parameters.len()
                ))
            );
        } else {
            mismatched_files += 1;
            for key in &report.arity_mismatches {
                eprintln!(
                    "{}",
                    output::format_warning(&format!(
                        "{}: key '{}' does not have {} fields and can never match",
                        report.rule,
                        key,
                        report.input_parameters.len()
                    ))
                );
            }
        }
    }

    if config.strict && mismatched_files > 0 {
        anyhow::bail!("{} rule file(s) contain unmatchable keys", mismatched_files);
    }

    Ok(())
}

/// Load one rule file and collect its findings
pub fn validate_file(store: &FileRuleStore, file: &Path) -> Result<ValidationReport> {
    let definition = store
        .load(file)
        .with_context(|| format!("Failed to load rule: {}", file.display()))?;

    Ok(ValidationReport {
        rule: file.display().to_string(),
        entries: definition.rules.len(),
        arity_mismatches: definition
            .arity_mismatches()
            .into_iter()
            .map(str::to_string)
            .collect(),
        input_parameters: definition.input_parameters,
    })
}
