//! SQLite repositories. Each function takes an open connection and the
//! database path used for error reporting.

pub mod contributions;
pub mod jobs;
pub mod members;
pub mod notifications;
pub mod tickets;
