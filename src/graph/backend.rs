//! Collaborator seams between the search pipeline and whatever holds the
//! graph.
//!
//! [`GraphBackend`] exposes the primitive reads the relationship resolver is
//! built on; [`FullTextIndex`] exposes the named-index query the fanout
//! issues. [`GraphStore`](super::store::GraphStore) implements both over
//! SQLite and [`MemoryGraph`](super::memory::MemoryGraph) implements both in
//! memory.

use crate::error::Result;
use crate::types::{EdgeRecord, Entity, ScoredEntity};

/// Primitive graph reads. All calls are blocking.
pub trait GraphBackend {
    /// Fetch an entity by uid, `None` when it does not exist.
    fn entity(&self, uid: &str) -> Result<Option<Entity>>;

    /// Edges of `rel_type` whose source is `uid`.
    fn out_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>>;

    /// Edges of `rel_type` whose target is `uid`.
    fn in_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>>;

    /// Distinct officers serving (now or formerly) in any unit established
    /// by the agency. A derived aggregate owned by the store.
    fn total_officers(&self, agency_uid: &str) -> Result<u64>;
}

/// A set of named full-text indexes.
pub trait FullTextIndex {
    /// Run `query` against the index called `index`.
    ///
    /// Returned pairs carry the index's own relevance score, higher is
    /// better. Order is unspecified; callers sort.
    fn query(&self, index: &str, query: &str) -> Result<Vec<ScoredEntity>>;
}
