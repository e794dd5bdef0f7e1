//! Source implementations
//!
//! In-memory sources back tests and the CLI (which fills them from JSON files).
//! No-op sources always return nothing.

use crate::observation::AbstractedObservation;
use crate::provider::{AbstractionSource, RecordSource, Row, SourceError, SourceResult};
use crate::value::ScalarValue;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// Abstraction source holding observations per patient
#[derive(Default)]
pub struct InMemoryAbstractionSource {
    observations: RwLock<HashMap<String, Vec<AbstractedObservation>>>,
}

impl InMemoryAbstractionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the observations of a patient
    pub fn insert(&self, patient_id: impl Into<String>, observations: Vec<AbstractedObservation>) {
        self.observations.write().insert(patient_id.into(), observations);
    }

    /// Append one observation to a patient
    pub fn push(&self, patient_id: impl Into<String>, observation: AbstractedObservation) {
        self.observations
            .write()
            .entry(patient_id.into())
            .or_default()
            .push(observation);
    }

    /// Number of patients with at least one stored entry
    pub fn patient_count(&self) -> usize {
        self.observations.read().len()
    }

    /// Load from a JSON object mapping patient id to an observation array
    pub fn from_json(json: &str) -> SourceResult<Self> {
        let parsed: IndexMap<String, Vec<AbstractedObservation>> =
            serde_json::from_str(json).map_err(|e| SourceError::ParseError(e.to_string()))?;

        let source = Self::new();
        for (patient_id, observations) in parsed {
            source.insert(patient_id, observations);
        }
        log::debug!("Loaded abstracted data for {} patients", source.patient_count());
        Ok(source)
    }

    /// Load from a JSON file, see [`InMemoryAbstractionSource::from_json`]
    pub fn from_json_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SourceError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl AbstractionSource for InMemoryAbstractionSource {
    fn fetch_abstracted(
        &self,
        patient_id: &str,
        _snapshot: NaiveDateTime,
    ) -> SourceResult<Vec<AbstractedObservation>> {
        Ok(self
            .observations
            .read()
            .get(patient_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Record source answering fixed queries with canned rows
#[derive(Default)]
pub struct InMemoryRecordSource {
    results: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the rows returned for `query`
    pub fn set_result(&self, query: impl Into<String>, rows: Vec<Row>) {
        self.results.write().insert(query.into(), rows);
    }

    /// Configure the rows for `query` from a JSON array of arrays
    pub fn set_result_json(&self, query: impl Into<String>, json: &str) -> SourceResult<()> {
        let rows: Vec<Row> =
            serde_json::from_str(json).map_err(|e| SourceError::ParseError(e.to_string()))?;
        self.set_result(query, rows);
        Ok(())
    }

    /// Configure the rows for `query` from a JSON file
    pub fn set_result_file(&self, query: impl Into<String>, path: impl AsRef<Path>) -> SourceResult<()> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SourceError::IoError(format!("{}: {}", path.display(), e)))?;
        self.set_result_json(query, &json)
    }
}

impl RecordSource for InMemoryRecordSource {
    fn fetch_records(&self, query: &str, _params: &[ScalarValue]) -> SourceResult<Vec<Row>> {
        self.results
            .read()
            .get(query)
            .cloned()
            .ok_or_else(|| SourceError::UnknownQuery(query.to_string()))
    }
}

/// NoOp abstraction source for testing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAbstractionSource;

impl AbstractionSource for NoOpAbstractionSource {
    fn fetch_abstracted(
        &self,
        _patient_id: &str,
        _snapshot: NaiveDateTime,
    ) -> SourceResult<Vec<AbstractedObservation>> {
        Ok(vec![])
    }
}

/// NoOp record source for testing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpRecordSource;

impl RecordSource for NoOpRecordSource {
    fn fetch_records(&self, _query: &str, _params: &[ScalarValue]) -> SourceResult<Vec<Row>> {
        Ok(vec![])
    }
}
