//! Graph layer: storage traits, the SQLite store, and relationship resolution.

pub mod backend;
pub mod fulltext;
pub mod memory;
pub mod relations;
pub mod store;

pub use backend::{FullTextIndex, GraphBackend};
pub use memory::MemoryGraph;
pub use relations::{LatestCitation, PrimarySourcePolicy, Relation, RelationshipResolver};
pub use store::GraphStore;
