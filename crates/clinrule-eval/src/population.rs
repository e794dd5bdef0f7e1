//! Population analysis
//!
//! Runs [`PatientAnalyzer`] over every patient in the roster. A failure for one patient
//! becomes a [`PatientOutcome::Failed`] entry and the scan moves on.

use crate::analyzer::PatientAnalyzer;
use crate::error::EvalResult;
use crate::result::AnalysisResult;
use chrono::NaiveDateTime;
use clinrule_model::{PatientRecord, RecordSource, Row};
use serde::Serialize;
use std::sync::Arc;

/// Record for a patient whose analysis failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientFailure {
    pub patient_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub error: String,
}

/// Result of one roster entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatientOutcome {
    Analyzed(AnalysisResult),
    Failed(PatientFailure),
}

impl PatientOutcome {
    pub fn patient_id(&self) -> &str {
        match self {
            Self::Analyzed(result) => &result.patient_id,
            Self::Failed(failure) => &failure.patient_id,
        }
    }

    pub fn as_analyzed(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Analyzed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&PatientFailure> {
        match self {
            Self::Analyzed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Counts over a batch of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Analyzed with a compound outcome
    pub matched: usize,
    /// Analyzed, data present, no compound outcome
    pub unmatched: usize,
    pub no_data: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[PatientOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            summary.total += 1;
            match outcome {
                PatientOutcome::Failed(_) => summary.failed += 1,
                PatientOutcome::Analyzed(result) if result.is_no_data() => summary.no_data += 1,
                PatientOutcome::Analyzed(result) if result.outcome.is_some() => summary.matched += 1,
                PatientOutcome::Analyzed(_) => summary.unmatched += 1,
            }
            summary
        })
    }
}

/// Analyzes every patient returned by the roster query
pub struct PopulationAnalyzer {
    analyzer: PatientAnalyzer,
    records: Arc<dyn RecordSource>,
    roster_query: String,
}

impl PopulationAnalyzer {
    pub fn new(
        analyzer: PatientAnalyzer,
        records: Arc<dyn RecordSource>,
        roster_query: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            records,
            roster_query: roster_query.into(),
        }
    }

    /// Get the patient analyzer
    pub fn analyzer(&self) -> &PatientAnalyzer {
        &self.analyzer
    }

    /// Get the roster query
    pub fn roster_query(&self) -> &str {
        &self.roster_query
    }

    /// Analyze all patients at `snapshot`, in roster order.
    ///
    /// A missing snapshot is resolved once, so every patient shares the same instant.
    /// Only a failure to fetch the roster itself is returned as an error.
    pub fn analyze_all(&self, snapshot: Option<NaiveDateTime>) -> EvalResult<Vec<PatientOutcome>> {
        let rows = self.records.fetch_records(&self.roster_query, &[])?;

        if rows.is_empty() {
            log::info!("Roster query '{}' returned no patients", self.roster_query);
            return Ok(Vec::new());
        }

        let snapshot = snapshot.unwrap_or_else(|| self.analyzer.now());
        log::info!(
            "Analyzing {} patients for {}",
            rows.len(),
            self.analyzer.rule().name
        );

        let outcomes: Vec<PatientOutcome> = rows
            .iter()
            .map(|row| self.analyze_row(row, snapshot))
            .collect();

        let summary = BatchSummary::from_outcomes(&outcomes);
        log::info!(
            "Batch complete: {} matched, {} unmatched, {} without data, {} failed",
            summary.matched,
            summary.unmatched,
            summary.no_data,
            summary.failed
        );

        Ok(outcomes)
    }

    fn analyze_row(&self, row: &Row, snapshot: NaiveDateTime) -> PatientOutcome {
        let record = match PatientRecord::from_row(row) {
            Ok(record) => record,
            Err(e) => {
                let patient_id = row.first().map(|v| v.key_field()).unwrap_or_default();
                log::warn!("Skipping roster row for patient '{}': {}", patient_id, e);
                return PatientOutcome::Failed(PatientFailure {
                    patient_id,
                    first_name: None,
                    last_name: None,
                    error: e.to_string(),
                });
            }
        };

        match self.analyzer.analyze(&record.patient_id, Some(snapshot)) {
            Ok(result) => {
                PatientOutcome::Analyzed(result.with_names(record.first_name, record.last_name))
            }
            Err(e) => {
                log::warn!("Analysis failed for patient {}: {}", record.patient_id, e);
                PatientOutcome::Failed(PatientFailure {
                    patient_id: record.patient_id,
                    first_name: record.first_name,
                    last_name: record.last_name,
                    error: e.to_string(),
                })
            }
        }
    }
}
