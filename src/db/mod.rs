//! SQLite persistence: schema and row conversion.

pub mod converters;
pub mod schema;
