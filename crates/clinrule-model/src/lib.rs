//! clinrule data model
//!
//! This crate provides:
//! - Abstracted observations with validity intervals
//! - Scalar input values and their rule-key coercion
//! - Timestamp parsing shared by files, configs and the CLI
//! - Data source traits for the abstraction and data-access collaborators
//! - In-memory and no-op source implementations

pub mod observation;
pub mod provider;
pub mod source;
pub mod timestamp;
pub mod value;

pub use observation::*;
pub use provider::*;
pub use source::*;
pub use timestamp::{TIMESTAMP_FORMAT, format_timestamp, parse_timestamp};
pub use value::ScalarValue;
