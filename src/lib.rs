//! roster-search: free-text search over officers, agencies and units.
//!
//! A query fans out over three SQLite FTS5 name indexes, the hits are ranked
//! by relevance, and the top ten are projected into uniform
//! [`SearchResult`](types::SearchResult) summaries using the surrounding
//! graph (unit membership, parent agency, commander, cited sources).

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod http;
pub mod observability;
pub mod search;
pub mod types;
pub mod utils;
