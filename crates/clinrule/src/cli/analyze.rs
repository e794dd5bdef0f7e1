//! Analyze and analyze-all command implementations
//!
//! Abstracted data comes from a JSON file mapping patient ids to observation arrays.
//! The roster for `analyze-all` is a JSON array of `[id, first name, last name, ..]` rows.

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clinrule_eval::{BatchSummary, EngineConfig, PatientAnalyzer, PopulationAnalyzer};
use clinrule_model::{InMemoryAbstractionSource, InMemoryRecordSource, parse_timestamp};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by both analysis commands
pub struct AnalysisOptions {
    pub data: PathBuf,
    pub snapshot: Option<String>,
    pub rule_name: String,
    pub config_file: Option<PathBuf>,
    pub rules_folder: Option<PathBuf>,
    pub omit_data: bool,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

/// Configuration for analyze command
pub struct AnalyzeConfig {
    pub patient_id: String,
    pub options: AnalysisOptions,
}

/// Configuration for analyze-all command
pub struct AnalyzeAllConfig {
    pub roster: PathBuf,
    pub options: AnalysisOptions,
}

/// Analyze one patient
pub fn analyze(config: AnalyzeConfig) -> Result<()> {
    let options = &config.options;
    let (engine_config, analyzer) = build_analyzer(options)?;
    log::debug!("Rules folder: {:?}", engine_config.rules_folder);

    let result = analyzer
        .analyze(&config.patient_id, parse_snapshot(options.snapshot.as_deref())?)
        .with_context(|| format!("Failed to analyze patient {}", config.patient_id))?;

    if result.is_no_data() {
        eprintln!(
            "{}",
            output::format_warning(&format!("No abstracted data for patient {}", result.patient_id))
        );
    }

    output::print_output(&result, output_format(options), options.output_file.as_deref())
}

/// Analyze every patient in the roster
pub fn analyze_all(config: AnalyzeAllConfig) -> Result<()> {
    let options = &config.options;
    let (engine_config, analyzer) = build_analyzer(options)?;

    let records = InMemoryRecordSource::new();
    records
        .set_result_file(engine_config.roster_query.clone(), &config.roster)
        .with_context(|| format!("Failed to load roster: {}", config.roster.display()))?;

    let population = PopulationAnalyzer::new(analyzer, Arc::new(records), engine_config.roster_query);
    let outcomes = population
        .analyze_all(parse_snapshot(options.snapshot.as_deref())?)
        .context("Failed to run population analysis")?;

    let summary = BatchSummary::from_outcomes(&outcomes);
    let message = format!(
        "{} patients: {} matched, {} unmatched, {} without data, {} failed",
        summary.total, summary.matched, summary.unmatched, summary.no_data, summary.failed
    );
    if summary.failed > 0 {
        eprintln!("{}", output::format_warning(&message));
    } else {
        eprintln!("{}", output::format_success(&message));
    }

    output::print_output(&outcomes, output_format(options), options.output_file.as_deref())
}

fn build_analyzer(options: &AnalysisOptions) -> Result<(EngineConfig, PatientAnalyzer)> {
    let mut engine_config =
        super::load_config(options.config_file.as_deref(), options.rules_folder.clone())?;
    if options.omit_data {
        engine_config.include_abstracted_data = false;
    }

    let source = load_observations(&options.data)?;
    let analyzer = PatientAnalyzer::from_config(&engine_config, &options.rule_name, Arc::new(source))?;

    Ok((engine_config, analyzer))
}

fn load_observations(path: &Path) -> Result<InMemoryAbstractionSource> {
    InMemoryAbstractionSource::from_json_file(path)
        .with_context(|| format!("Failed to load abstracted data: {}", path.display()))
}

fn output_format(options: &AnalysisOptions) -> OutputFormat {
    OutputFormat::parse(options.output_format.as_deref().unwrap_or("pretty"))
}

/// Parse an optional snapshot argument
pub fn parse_snapshot(snapshot: Option<&str>) -> Result<Option<NaiveDateTime>> {
    snapshot
        .map(|s| parse_timestamp(s).with_context(|| format!("Invalid snapshot date: '{}'", s)))
        .transpose()
}
