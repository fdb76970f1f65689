//! Domain atoms for the task tracker: the task record and the three
//! storage-side adapters it is built on.
//!
//! Each adapter is a trait with an AWS-backed implementation and an
//! in-memory one. Callers receive adapters as arguments; nothing in this
//! crate reads the environment or builds clients.

pub mod error;
pub mod labels;
pub mod media;
pub mod tasks;

pub use error::TaskError;

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
