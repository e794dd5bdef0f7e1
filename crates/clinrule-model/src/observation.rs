//! Abstracted observations and roster records

use crate::provider::{SourceError, SourceResult};
use crate::timestamp::serde_timestamp;
use crate::value::ScalarValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A categorical value derived from raw measurements, valid over `[start, end]`
///
/// Field names on the wire follow the tabular layout produced by the abstraction
/// pipeline (`Concept Name`, `Value`, `StartDateTime`, `EndDateTime`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractedObservation {
    #[serde(rename = "Concept Name")]
    pub concept: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "StartDateTime", with = "serde_timestamp")]
    pub start: NaiveDateTime,
    #[serde(rename = "EndDateTime", with = "serde_timestamp")]
    pub end: NaiveDateTime,
}

impl AbstractedObservation {
    pub fn new(
        concept: impl Into<String>,
        value: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            concept: concept.into(),
            value: value.into(),
            start,
            end,
        }
    }

    /// Whether `instant` falls inside the validity interval (both bounds inclusive)
    pub fn is_valid_at(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// One row of the patient roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl PatientRecord {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Build a record from an `(id, first name, last name, ..)` row.
    ///
    /// Columns after the third are ignored.
    pub fn from_row(row: &[ScalarValue]) -> SourceResult<Self> {
        if row.len() < 3 {
            return Err(SourceError::MalformedRecord(format!(
                "expected at least 3 columns (id, first name, last name), found {}",
                row.len()
            )));
        }

        let name = |value: &ScalarValue| (!value.is_null()).then(|| value.to_string());

        Ok(Self {
            patient_id: row[0].key_field().trim().to_string(),
            first_name: name(&row[1]),
            last_name: name(&row[2]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_validity_bounds_are_inclusive() {
        let obs = AbstractedObservation::new(
            "WBC_Level",
            "Low",
            ts("2024-01-01 00:00:00"),
            ts("2024-01-02 00:00:00"),
        );

        assert!(obs.is_valid_at(ts("2024-01-01 00:00:00")));
        assert!(obs.is_valid_at(ts("2024-01-02 00:00:00")));
        assert!(!obs.is_valid_at(ts("2024-01-02 00:00:01")));
        assert!(!obs.is_valid_at(ts("2023-12-31 23:59:59")));
    }

    #[test]
    fn test_observation_json_columns() {
        let json = r#"{
            "Concept Name": "Hemoglobin_Level",
            "Value": "Severe Anemia",
            "StartDateTime": "2024-01-01 08:00:00",
            "EndDateTime": "2024-01-03T08:00:00"
        }"#;

        let obs: AbstractedObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.concept, "Hemoglobin_Level");
        assert_eq!(obs.end, ts("2024-01-03 08:00:00"));

        let back = serde_json::to_value(&obs).unwrap();
        assert_eq!(back["EndDateTime"], "2024-01-03 08:00:00");
    }

    #[test]
    fn test_record_from_row() {
        let row = vec![
            ScalarValue::Integer(1001),
            ScalarValue::text("Ada"),
            ScalarValue::text("Lovelace"),
            ScalarValue::text("F"),
        ];

        let record = PatientRecord::from_row(&row).unwrap();
        assert_eq!(record, PatientRecord::new("1001").with_name("Ada", "Lovelace"));
    }

    #[test]
    fn test_record_from_short_row() {
        let row = vec![ScalarValue::text("1001")];
        assert!(matches!(
            PatientRecord::from_row(&row),
            Err(SourceError::MalformedRecord(_))
        ));
    }
}
