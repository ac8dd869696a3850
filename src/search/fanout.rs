//! Query fanout across the named full-text indexes.

use crate::db::schema::FULLTEXT_INDEXES;
use crate::error::{Result, SearchError};
use crate::graph::backend::FullTextIndex;
use crate::types::ScoredEntity;

/// Issues one query against every configured index and merges the hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQueryFanout {
    indexes: Vec<String>,
}

impl Default for IndexQueryFanout {
    /// One index per entity kind: officers, agencies, units.
    fn default() -> Self {
        Self::new(FULLTEXT_INDEXES.iter().map(|def| def.name))
    }
}

impl IndexQueryFanout {
    pub fn new<I, S>(indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indexes: indexes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    /// Query every index, union the hits, and sort by score descending.
    ///
    /// Any failing index fails the whole fanout; partial unions are never
    /// returned. The result is not truncated.
    pub fn run<X: FullTextIndex + ?Sized>(
        &self,
        index: &X,
        query: &str,
    ) -> Result<Vec<ScoredEntity>> {
        let mut merged = Vec::new();
        for name in &self.indexes {
            let hits = index.query(name, query).map_err(|e| {
                tracing::warn!(index = %name, error = %e, "full-text index query failed");
                SearchError::IndexQuery {
                    index: name.clone(),
                    message: e.to_string(),
                }
            })?;
            tracing::debug!(index = %name, hits = hits.len(), "full-text index queried");
            merged.extend(hits);
        }
        sort_by_score(&mut merged);
        Ok(merged)
    }
}

/// Sort hits by score, highest first.
///
/// The sort is stable, so equal scores keep the order the indexes produced
/// them in (index order, then each index's own order).
pub fn sort_by_score(hits: &mut [ScoredEntity]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraph;
    use crate::types::Entity;
    use pretty_assertions::assert_eq;

    fn graph() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        g.add_entity(Entity::new("o1", &["Officer"]));
        g.add_entity(Entity::new("o2", &["Officer"]));
        g.add_entity(Entity::new("a1", &["Agency"]));
        g.add_entity(Entity::new("u1", &["Unit"]));
        g.add_hit("officerNames", "o1", 0.4);
        g.add_hit("officerNames", "o2", 2.5);
        g.add_hit("agencyNames", "a1", 1.0);
        g.add_hit("unitNames", "u1", 3.0);
        g
    }

    fn uids(hits: &[ScoredEntity]) -> Vec<&str> {
        hits.iter().map(|h| h.entity.uid.as_str()).collect()
    }

    #[test]
    fn default_fans_out_over_three_indexes() {
        let fanout = IndexQueryFanout::default();
        assert_eq!(
            fanout.indexes(),
            &["officerNames", "agencyNames", "unitNames"]
        );
    }

    #[test]
    fn union_is_sorted_by_score_descending() {
        let merged = IndexQueryFanout::default().run(&graph(), "q").unwrap();
        assert_eq!(uids(&merged), vec!["u1", "o2", "a1", "o1"]);
    }

    #[test]
    fn equal_scores_keep_index_order() {
        let mut g = MemoryGraph::new();
        g.add_entity(Entity::new("u1", &["Unit"]));
        g.add_entity(Entity::new("a1", &["Agency"]));
        g.add_hit("unitNames", "u1", 1.0);
        g.add_hit("agencyNames", "a1", 1.0);
        let merged = IndexQueryFanout::default().run(&g, "q").unwrap();
        assert_eq!(uids(&merged), vec!["a1", "u1"]);
    }

    #[test]
    fn one_failing_index_fails_the_fanout() {
        let mut g = graph();
        g.fail_index("agencyNames");
        let err = IndexQueryFanout::default().run(&g, "q").unwrap_err();
        match err {
            SearchError::IndexQuery { index, .. } => assert_eq!(index, "agencyNames"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_indexes_yield_empty_union() {
        let merged = IndexQueryFanout::default()
            .run(&MemoryGraph::new(), "q")
            .unwrap();
        assert!(merged.is_empty());
    }
}
