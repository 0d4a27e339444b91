pub(crate) mod common;
pub mod contributions;
pub mod dash;
pub mod insights;
pub mod members;
pub mod reminders;
pub mod tickets;
