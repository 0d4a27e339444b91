pub mod classify;
pub mod date;
pub mod insights;
pub mod messages;
pub mod patterns;
pub mod policy;
pub mod prediction;
pub mod query;
pub mod risk;
pub mod status;
pub mod types;
