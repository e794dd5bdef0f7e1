//! Per-patient analysis results

use chrono::NaiveDateTime;
use clinrule_model::{AbstractedObservation, format_timestamp};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Error marker for patients without abstracted data
pub const NO_DATA_MESSAGE: &str = "No abstracted data available for this patient";

/// Field names a serialized result always or optionally carries
pub const RESERVED_FIELDS: &[&str] = &[
    "patient_id",
    "snapshot_date",
    "individual_states",
    "error",
    "abstracted_data",
    "first_name",
    "last_name",
];

/// Outcome of analyzing one patient at one snapshot
///
/// When any individual state is `None`, `outcome` is `None` as well.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub patient_id: String,
    pub snapshot_date: NaiveDateTime,
    /// Individual states keyed by rule parameter name, in rule input order
    pub individual_states: IndexMap<String, Option<String>>,
    /// Name of the compound state (e.g. `hematological_state`)
    pub outcome_name: String,
    pub outcome: Option<String>,
    pub error: Option<String>,
    pub abstracted_data: Option<Vec<AbstractedObservation>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AnalysisResult {
    /// Result for a patient whose abstracted data is empty
    pub fn no_data<'a>(
        patient_id: impl Into<String>,
        snapshot_date: NaiveDateTime,
        outcome_name: impl Into<String>,
        parameters: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            snapshot_date,
            individual_states: parameters
                .into_iter()
                .map(|param| (param.to_string(), None))
                .collect(),
            outcome_name: outcome_name.into(),
            outcome: None,
            error: Some(NO_DATA_MESSAGE.to_string()),
            abstracted_data: None,
            first_name: None,
            last_name: None,
        }
    }

    /// Whether this result carries the no-data marker
    pub fn is_no_data(&self) -> bool {
        self.error.as_deref() == Some(NO_DATA_MESSAGE)
    }

    /// Individual state for a rule parameter
    pub fn individual_state(&self, parameter: &str) -> Option<&str> {
        self.individual_states.get(parameter)?.as_deref()
    }

    /// Attach roster display attributes
    pub fn with_names(mut self, first_name: Option<String>, last_name: Option<String>) -> Self {
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }
}

/// Serializes to a flat record with the compound state under its own name:
/// `patient_id`, `snapshot_date`, `individual_states`, `<outcome_name>`, then the
/// optional `error`, `abstracted_data`, `first_name` and `last_name` when present.
impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("patient_id", &self.patient_id)?;
        map.serialize_entry("snapshot_date", &format_timestamp(&self.snapshot_date))?;
        map.serialize_entry("individual_states", &self.individual_states)?;
        map.serialize_entry(&self.outcome_name, &self.outcome)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(data) = &self.abstracted_data {
            map.serialize_entry("abstracted_data", data)?;
        }
        if let Some(first_name) = &self.first_name {
            map.serialize_entry("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            map.serialize_entry("last_name", last_name)?;
        }
        map.end()
    }
}
