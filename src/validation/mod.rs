//! Sample validation and error reporting

pub mod data;
pub mod error;

pub use data::{SampleValidator, ValidationConfig, ValidationError};
pub use error::{ErrorClass, ErrorRecord, ErrorReporter, ErrorSummary};
