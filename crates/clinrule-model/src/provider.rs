//! Data source traits consumed by the evaluation engine

use crate::observation::AbstractedObservation;
use crate::value::ScalarValue;
use chrono::NaiveDateTime;

/// A tabular record returned by a [`RecordSource`]
pub type Row = Vec<ScalarValue>;

/// Result type for data source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Trait for the abstraction pipeline that turns raw measurements into abstracted values
pub trait AbstractionSource: Send + Sync {
    /// Abstracted observations for one patient as of `snapshot`
    ///
    /// An empty collection means no data is available; it is not an error.
    fn fetch_abstracted(
        &self,
        patient_id: &str,
        snapshot: NaiveDateTime,
    ) -> SourceResult<Vec<AbstractedObservation>>;
}

/// Trait for the data-access layer running named queries
pub trait RecordSource: Send + Sync {
    /// Run `query` with positional `params` and return its rows
    fn fetch_records(&self, query: &str, params: &[ScalarValue]) -> SourceResult<Vec<Row>>;
}

/// Data source error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
