//! Session surface
//!
//! `SurveySession` ties the sensors, smoothers, store and collaborators
//! together behind one single-threaded object driven by sensor callbacks and
//! an external clock.

pub mod formatting;
pub mod scheduler;
pub mod session;
pub mod types;

pub use formatting::{export_readings, CsvFormatter, JsonFormatter, ReadingFormatter, TextFormatter};
pub use scheduler::PeriodicTask;
pub use session::SurveySession;
pub use types::{
    ApiError, ApiResult, OutputFormat, SessionEvent, SessionState, SessionStatus, SyncOutcome, TickReport,
};
