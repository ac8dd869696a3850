//! SQLite graph store.
//!
//! Typed wrapper around the roster database. Reads go through
//! [`Connection::prepare_cached`], so each statement is compiled once per
//! connection and reused from rusqlite's statement cache afterwards.
//!
//! The search pipeline only reads. The upsert/insert operations exist for
//! the external loaders that own the data, and for tests.

use rusqlite::{params, Connection, OpenFlags};

use crate::db::converters::{row_to_edge, row_to_entity};
use crate::db::schema::initialize_database;
use crate::error::Result;
use crate::graph::backend::GraphBackend;
use crate::types::{EdgeRecord, Entity, Properties};

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// Aggregate statistics about the stored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub entities: usize,
    pub edges: usize,
}

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const UPSERT_ENTITY_SQL: &str = "\
INSERT INTO entities (uid, labels, properties)
VALUES (?1, ?2, ?3)
ON CONFLICT(uid) DO UPDATE SET
  labels = excluded.labels,
  properties = excluded.properties";

const INSERT_EDGE_SQL: &str = "\
INSERT INTO edges (source_id, target_id, type, properties)
VALUES (?1, ?2, ?3, ?4)";

const GET_ENTITY_SQL: &str = "\
SELECT uid, labels, properties FROM entities WHERE uid = ?1";

const OUT_EDGES_SQL: &str = "\
SELECT id, source_id, target_id, type, properties
FROM edges WHERE source_id = ?1 AND type = ?2
ORDER BY id";

const IN_EDGES_SQL: &str = "\
SELECT id, source_id, target_id, type, properties
FROM edges WHERE target_id = ?1 AND type = ?2
ORDER BY id";

// Units established by the agency, then every officer with a membership
// edge into one of those units, counted once. Edges whose unit or officer
// row is missing are skipped.
const TOTAL_OFFICERS_SQL: &str = "\
SELECT COUNT(DISTINCT m.source_id)
FROM edges est
JOIN entities u ON u.uid = est.source_id
JOIN edges m ON m.target_id = est.source_id AND m.type = 'MEMBER_OF_UNIT'
JOIN entities o ON o.uid = m.source_id
WHERE est.target_id = ?1 AND est.type = 'ESTABLISHED_BY'";

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Typed access to the roster SQLite database.
///
/// One `GraphStore` is one connection. The HTTP surface opens a fresh one per
/// request via [`GraphStore::connect`], so no connection is shared between
/// requests.
pub struct GraphStore {
    pub conn: Connection,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore").finish_non_exhaustive()
    }
}

impl GraphStore {
    /// Open (or create) the database at `db_path`, apply the schema, and
    /// return a ready-to-use store.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = initialize_database(db_path)?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection whose schema is in place.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open an existing database read-only, without touching its schema.
    /// A missing file is an error and is never created.
    pub fn connect(db_path: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------
    // Loader operations
    // -------------------------------------------------------------------

    /// Insert or update a single entity.
    pub fn upsert_entity(&self, entity: &Entity) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(UPSERT_ENTITY_SQL)?;
        stmt.execute(params![
            entity.uid,
            serde_json::to_string(&entity.labels)?,
            serde_json::Value::Object(entity.properties.clone()).to_string(),
        ])?;
        Ok(())
    }

    /// Batch-upsert entities inside a single transaction.
    pub fn upsert_entities(&self, entities: &[Entity]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_ENTITY_SQL)?;
            for entity in entities {
                stmt.execute(params![
                    entity.uid,
                    serde_json::to_string(&entity.labels)?,
                    serde_json::Value::Object(entity.properties.clone()).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Record a new edge and return its id. Edges are never merged: two
    /// memberships of the same officer in the same unit are two rows.
    pub fn insert_edge(
        &self,
        source: &str,
        target: &str,
        rel_type: &str,
        attributes: &Properties,
    ) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(INSERT_EDGE_SQL)?;
        stmt.execute(params![
            source,
            target,
            rel_type,
            serde_json::Value::Object(attributes.clone()).to_string(),
        ])?;
        Ok(self.conn.last_insert_rowid())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Retrieve a single entity by uid, or `None` if it doesn't exist.
    pub fn get_entity(&self, uid: &str) -> Result<Option<Entity>> {
        let mut stmt = self.conn.prepare_cached(GET_ENTITY_SQL)?;
        let mut rows = stmt.query_and_then(params![uid], row_to_entity)?;
        rows.next().transpose()
    }

    /// Outgoing edges of `rel_type` from `uid`, oldest first.
    pub fn get_out_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        let mut stmt = self.conn.prepare_cached(OUT_EDGES_SQL)?;
        let rows = stmt.query_and_then(params![uid, rel_type], row_to_edge)?;
        rows.collect()
    }

    /// Incoming edges of `rel_type` into `uid`, oldest first.
    pub fn get_in_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        let mut stmt = self.conn.prepare_cached(IN_EDGES_SQL)?;
        let rows = stmt.query_and_then(params![uid, rel_type], row_to_edge)?;
        rows.collect()
    }

    /// Distinct officers with a membership in any unit of the agency.
    pub fn count_agency_officers(&self, agency_uid: &str) -> Result<u64> {
        let mut stmt = self.conn.prepare_cached(TOTAL_OFFICERS_SQL)?;
        let count: i64 = stmt.query_row(params![agency_uid], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn get_stats(&self) -> Result<GraphStats> {
        let entities: i64 = self
            .conn
            .prepare_cached("SELECT count(*) FROM entities")?
            .query_row([], |row| row.get(0))?;
        let edges: i64 = self
            .conn
            .prepare_cached("SELECT count(*) FROM edges")?
            .query_row([], |row| row.get(0))?;
        Ok(GraphStats {
            entities: entities as usize,
            edges: edges as usize,
        })
    }
}

impl GraphBackend for GraphStore {
    fn entity(&self, uid: &str) -> Result<Option<Entity>> {
        self.get_entity(uid)
    }

    fn out_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        self.get_out_edges(uid, rel_type)
    }

    fn in_edges(&self, uid: &str, rel_type: &str) -> Result<Vec<EdgeRecord>> {
        self.get_in_edges(uid, rel_type)
    }

    fn total_officers(&self, agency_uid: &str) -> Result<u64> {
        self.count_agency_officers(agency_uid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
