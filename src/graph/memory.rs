//! In-memory graph backend.
//!
//! Holds entities and edge records in plain maps and answers full-text
//! queries from hits registered per index, so callers control scores
//! exactly. Useful for embedding the pipeline without SQLite and for tests;
//! it is `Send + Sync`, which makes it usable with parallel projection.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Result, SearchError};
use crate::graph::backend::{FullTextIndex, GraphBackend};
use crate::graph::relations::{ESTABLISHED_BY, MEMBER_OF_UNIT};
use crate::types::{EdgeRecord, Entity, Properties, ScoredEntity};

/// A scripted, in-memory graph.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    entities: HashMap<String, Entity>,
    edges: Vec<EdgeRecord>,
    hits: HashMap<String, Vec<(String, f64)>>,
    failing_indexes: HashSet<String>,
    read_failure: Option<String>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.uid.clone(), entity);
    }

    /// Record an edge and return its id. Ids increase with insertion order.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        rel_type: &str,
        attributes: Properties,
    ) -> i64 {
        let id = self.edges.len() as i64 + 1;
        self.edges.push(EdgeRecord {
            id,
            source: source.to_string(),
            target: target.to_string(),
            rel_type: rel_type.to_string(),
            attributes,
        });
        id
    }

    /// Make `index` return `uid` with `score` for any query.
    pub fn add_hit(&mut self, index: &str, uid: &str, score: f64) {
        self.hits
            .entry(index.to_string())
            .or_default()
            .push((uid.to_string(), score));
    }

    /// Make every query against `index` fail.
    pub fn fail_index(&mut self, index: &str) {
        self.failing_indexes.insert(index.to_string());
    }

    /// Make every graph read fail with `message`.
    pub fn fail_reads(&mut self, message: &str) {
        self.read_failure = Some(message.to_string());
    }

    fn check_reads(&self) -> Result<()> {
        match &self.read_failure {
            Some(message) => Err(SearchError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn edges_where<'a>(
        &'a self,
        rel_type: &'a str,
        pred: impl Fn(&EdgeRecord) -> bool + 'a,
    ) -> impl Iterator<Item = &'a EdgeRecord> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.rel_type == rel_type && pred(e))
    }
}

impl GraphBackend for MemoryGraph {
    fn entity(&self, uid: &str) -> Result<Option<Entity>> {
        self.check_reads()?;
        Ok(self.entities.get(uid).cloned())
    }

    fn out_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        self.check_reads()?;
        Ok(self
            .edges_where(rel_type, |e| e.source == uid)
            .cloned()
            .collect())
    }

    fn in_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        self.check_reads()?;
        Ok(self
            .edges_where(rel_type, |e| e.target == uid)
            .cloned()
            .collect())
    }

    fn total_officers(&self, agency_uid: &str) -> Result<u64> {
        self.check_reads()?;
        let units: HashSet<&str> = self
            .edges_where(ESTABLISHED_BY, |e| {
                e.target == agency_uid && self.entities.contains_key(&e.source)
            })
            .map(|e| e.source.as_str())
            .collect();
        let officers: BTreeSet<&str> = self
            .edges_where(MEMBER_OF_UNIT, |e| {
                units.contains(e.target.as_str()) && self.entities.contains_key(&e.source)
            })
            .map(|e| e.source.as_str())
            .collect();
        Ok(officers.len() as u64)
    }
}

impl FullTextIndex for MemoryGraph {
    fn query(&self, index: &str, _query: &str) -> Result<Vec<ScoredEntity>> {
        if self.failing_indexes.contains(index) {
            return Err(SearchError::Backend(format!("index {index} unavailable")));
        }
        let Some(hits) = self.hits.get(index) else {
            return Ok(Vec::new());
        };
        Ok(hits
            .iter()
            .filter_map(|(uid, score)| {
                self.entities.get(uid).map(|entity| ScoredEntity {
                    entity: entity.clone(),
                    score: *score,
                })
            })
            .collect())
    }
}
