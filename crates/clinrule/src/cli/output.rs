//! Output formatting utilities

use anyhow::{Context, Result};
use clinrule_eval::{AnalysisResult, PatientOutcome};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "json-pretty" => Self::JsonPretty,
            "table" => Self::Table,
            _ => Self::JsonPretty, // default
        }
    }
}

/// Values that have a table rendering
pub trait Tabular {
    fn to_table(&self) -> String;
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(io::stdout().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Serialize a value as JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

/// Render a value in the specified format
pub fn render<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(value, false),
        OutputFormat::JsonPretty => format_json(value, true),
        OutputFormat::Table => Ok(value.to_table()),
    }
}

/// Print a value in the specified format
pub fn print_output<T: Serialize + Tabular>(
    value: &T,
    format: OutputFormat,
    output_file: Option<&Path>,
) -> Result<()> {
    write_output(&render(value, format)?, output_file)
}

#[derive(Tabled)]
struct KeyValue {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl KeyValue {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Key/value table for any list of pairs
pub fn key_value_table<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> String {
    let rows: Vec<KeyValue> = pairs.into_iter().map(|(k, v)| KeyValue::new(k, v)).collect();
    Table::new(rows).with(Style::modern()).to_string()
}

fn display_opt(value: Option<&str>) -> String {
    value.unwrap_or("null").to_string()
}

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last].into_iter().flatten().collect::<Vec<_>>().join(" ")
}

impl Tabular for AnalysisResult {
    fn to_table(&self) -> String {
        let mut pairs = vec![
            ("patient_id".to_string(), self.patient_id.clone()),
            (
                "snapshot_date".to_string(),
                clinrule_model::format_timestamp(&self.snapshot_date),
            ),
        ];
        pairs.extend(
            self.individual_states
                .iter()
                .map(|(name, state)| (name.clone(), display_opt(state.as_deref()))),
        );
        pairs.push((self.outcome_name.clone(), display_opt(self.outcome.as_deref())));
        if let Some(error) = &self.error {
            pairs.push(("error".to_string(), error.clone()));
        }
        if let Some(data) = &self.abstracted_data {
            pairs.push(("abstracted_data".to_string(), format!("[{} observations]", data.len())));
        }
        key_value_table(pairs)
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Patient")]
    patient_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Individual States")]
    states: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&PatientOutcome> for OutcomeRow {
    fn from(outcome: &PatientOutcome) -> Self {
        match outcome {
            PatientOutcome::Analyzed(result) => Self {
                patient_id: result.patient_id.clone(),
                name: full_name(result.first_name.as_deref(), result.last_name.as_deref()),
                states: result
                    .individual_states
                    .iter()
                    .map(|(name, state)| format!("{}={}", name, display_opt(state.as_deref())))
                    .collect::<Vec<_>>()
                    .join(", "),
                outcome: display_opt(result.outcome.as_deref()),
                error: result.error.clone().unwrap_or_default(),
            },
            PatientOutcome::Failed(failure) => Self {
                patient_id: failure.patient_id.clone(),
                name: full_name(failure.first_name.as_deref(), failure.last_name.as_deref()),
                states: String::new(),
                outcome: String::new(),
                error: failure.error.clone(),
            },
        }
    }
}

impl Tabular for Vec<PatientOutcome> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "(no patients)".to_string();
        }
        let rows: Vec<OutcomeRow> = self.iter().map(OutcomeRow::from).collect();
        Table::new(rows).with(Style::modern()).to_string()
    }
}
