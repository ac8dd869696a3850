//! SQLite schema initialization for roster-search.
//!
//! Entities and edges are stored as rows with JSON property bags. Each named
//! full-text index is an FTS5 virtual table fed by triggers on `entities`
//! that only fire for rows carrying the index's kind label, so the indexes
//! stay in sync with whatever external loader writes the graph.

use rusqlite::Connection;

use crate::types::EntityKind;

// ---------------------------------------------------------------------------
// DDL constants
// ---------------------------------------------------------------------------

const CREATE_ENTITIES: &str = "\
CREATE TABLE IF NOT EXISTS entities (
  uid TEXT PRIMARY KEY,
  labels TEXT NOT NULL DEFAULT '[]',
  properties TEXT NOT NULL DEFAULT '{}'
)";

// No foreign keys: loaders may write an edge before its endpoint, and the
// resolver treats a dangling edge as an absent relation.
const CREATE_EDGES: &str = "\
CREATE TABLE IF NOT EXISTS edges (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  source_id TEXT NOT NULL,
  target_id TEXT NOT NULL,
  type TEXT NOT NULL,
  properties TEXT NOT NULL DEFAULT '{}'
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_edges_source_type ON edges(source_id, type)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target_type ON edges(target_id, type)",
];

// ---------------------------------------------------------------------------
// Full-text index definitions
// ---------------------------------------------------------------------------

/// One named full-text index: which label it covers and which entity
/// properties make up its searchable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullTextIndexDef {
    /// Public index name, as passed to the fanout.
    pub name: &'static str,
    /// Backing FTS5 virtual table.
    pub table: &'static str,
    pub label: EntityKind,
    /// Entity properties concatenated into the indexed text.
    pub fields: &'static [&'static str],
}

pub const OFFICER_NAMES: FullTextIndexDef = FullTextIndexDef {
    name: "officerNames",
    table: "fts_officer_names",
    label: EntityKind::Officer,
    fields: &["first_name", "middle_name", "last_name", "suffix"],
};

pub const AGENCY_NAMES: FullTextIndexDef = FullTextIndexDef {
    name: "agencyNames",
    table: "fts_agency_names",
    label: EntityKind::Agency,
    fields: &["name"],
};

pub const UNIT_NAMES: FullTextIndexDef = FullTextIndexDef {
    name: "unitNames",
    table: "fts_unit_names",
    label: EntityKind::Unit,
    fields: &["name"],
};

/// Every index the search fans out over, one per entity kind.
pub const FULLTEXT_INDEXES: &[FullTextIndexDef] = &[OFFICER_NAMES, AGENCY_NAMES, UNIT_NAMES];

/// Look up an index definition by its public name.
pub fn fulltext_index(name: &str) -> Option<&'static FullTextIndexDef> {
    FULLTEXT_INDEXES.iter().find(|def| def.name == name)
}

impl FullTextIndexDef {
    /// SQL expression producing the indexed text for the trigger row alias
    /// `row` (`new` or `old`).
    fn text_expr(&self, row: &str) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("coalesce(json_extract({row}.properties, '$.{f}'), '')"))
            .collect();
        format!("trim({})", parts.join(" || ' ' || "))
    }

    fn has_label_expr(&self, row: &str) -> String {
        format!(
            "EXISTS (SELECT 1 FROM json_each({row}.labels) WHERE value = '{}')",
            self.label.as_str()
        )
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(uid UNINDEXED, body)",
            self.table
        )
    }

    fn trigger_sql(&self) -> [String; 3] {
        let table = self.table;
        let insert_new = format!(
            "INSERT INTO {table}(uid, body) SELECT new.uid, {} WHERE {};",
            self.text_expr("new"),
            self.has_label_expr("new"),
        );
        [
            format!(
                "CREATE TRIGGER IF NOT EXISTS {table}_ai AFTER INSERT ON entities WHEN {} BEGIN\n  \
                 INSERT INTO {table}(uid, body) VALUES (new.uid, {});\nEND",
                self.has_label_expr("new"),
                self.text_expr("new"),
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS {table}_ad AFTER DELETE ON entities BEGIN\n  \
                 DELETE FROM {table} WHERE uid = old.uid;\nEND"
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS {table}_au AFTER UPDATE ON entities BEGIN\n  \
                 DELETE FROM {table} WHERE uid = old.uid;\n  {insert_new}\nEND"
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply the full schema to an open connection. Idempotent.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_ENTITIES)?;
    conn.execute_batch(CREATE_EDGES)?;
    for ddl in CREATE_INDEXES {
        conn.execute_batch(ddl)?;
    }

    for def in FULLTEXT_INDEXES {
        conn.execute_batch(&def.create_table_sql())?;
        for trigger in def.trigger_sql() {
            conn.execute_batch(&trigger)?;
        }
    }
    Ok(())
}

/// Open (or create) the SQLite database at `db_path` and apply the schema.
///
/// The returned connection has WAL mode and synchronous NORMAL configured.
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    apply_schema(&conn)?;
    Ok(conn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
