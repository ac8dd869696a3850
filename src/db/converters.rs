//! Row → domain type conversion for the `entities` and `edges` tables.

use rusqlite::Row;

use crate::error::Result;
use crate::types::{EdgeRecord, Entity, Properties};

/// Parse a JSON object column, treating NULL or empty text as `{}`.
fn parse_properties(raw: Option<String>) -> Result<Properties> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Properties::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

/// Convert a row shaped `(uid, labels, properties)` into an [`Entity`].
pub fn row_to_entity(row: &Row<'_>) -> Result<Entity> {
    let uid: String = row.get(0)?;
    let labels_raw: Option<String> = row.get(1)?;
    let labels: Vec<String> = match labels_raw.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(text) => serde_json::from_str(text)?,
    };
    let properties = parse_properties(row.get(2)?)?;
    Ok(Entity {
        uid,
        labels,
        properties,
    })
}

/// Convert a row shaped `(id, source_id, target_id, type, properties)` into
/// an [`EdgeRecord`].
pub fn row_to_edge(row: &Row<'_>) -> Result<EdgeRecord> {
    Ok(EdgeRecord {
        id: row.get(0)?,
        source: row.get(1)?,
        target: row.get(2)?,
        rel_type: row.get(3)?,
        attributes: parse_properties(row.get(4)?)?,
    })
}
