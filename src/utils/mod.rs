//! Shared utilities.

pub mod datetime;

pub use datetime::parse_flexible_datetime;
