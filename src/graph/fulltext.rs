//! FTS5-backed named full-text indexes.
//!
//! Each named index from [`FULLTEXT_INDEXES`](crate::db::schema::FULLTEXT_INDEXES)
//! is queried with its own BM25 ranking. Scores are inverted so higher means
//! more relevant, and otherwise passed through unmodified.

use rusqlite::params;

use crate::db::converters::row_to_entity;
use crate::db::schema::{fulltext_index, FullTextIndexDef};
use crate::error::{Result, SearchError};
use crate::graph::backend::FullTextIndex;
use crate::graph::store::GraphStore;
use crate::types::ScoredEntity;

/// Build the match query for one FTS5 table. Table names come from the
/// static index definitions, never from user input.
fn index_query_sql(def: &FullTextIndexDef) -> String {
    format!(
        "SELECT e.uid, e.labels, e.properties, bm25({t}) AS rank
         FROM {t} f
         JOIN entities e ON e.uid = f.uid
         WHERE {t} MATCH ?1
         ORDER BY rank, e.uid",
        t = def.table
    )
}

impl GraphStore {
    /// Run a sanitized query against one FTS5 index.
    pub fn search_index(&self, def: &FullTextIndexDef, query: &str) -> Result<Vec<ScoredEntity>> {
        let safe_query = sanitize_fts_query(query);
        if safe_query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = index_query_sql(def);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_and_then(params![safe_query], |row| {
            let entity = row_to_entity(row)?;
            let rank: f64 = row.get(3)?;
            Ok::<_, SearchError>(ScoredEntity {
                entity,
                // FTS5 rank is negative; invert so higher = better.
                score: -rank,
            })
        })?;
        rows.collect()
    }
}

impl FullTextIndex for GraphStore {
    fn query(&self, index: &str, query: &str) -> Result<Vec<ScoredEntity>> {
        let def = fulltext_index(index)
            .ok_or_else(|| SearchError::Backend(format!("unknown full-text index: {index}")))?;
        self.search_index(def, query)
    }
}

/// Sanitize a user query for FTS5 `MATCH`.
///
/// Strips FTS5 syntax and control characters, quotes every remaining token, and joins
/// them with `OR` so that any matching name token counts. Returns an empty
/// string when nothing usable is left.
pub fn sanitize_fts_query(query: &str) -> String {
    let tokens: Vec<String> = query
        .split_whitespace()
        .filter_map(|token| {
            let clean: String = token
                .chars()
                .filter(|c| {
                    !c.is_control()
                        && !matches!(
                            c,
                            '*' | '"' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '~' | ':' | '+'
                        )
                })
                .collect();
            if clean.is_empty() {
                None
            } else {
                Some(format!("\"{clean}\""))
            }
        })
        .collect();

    tokens.join(" OR ")
}
