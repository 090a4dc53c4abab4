use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::{validate_building_name, BuildingRow};

/// Retrieve every building in insertion order, which is also the order the
/// tree shows them in.
pub fn list_buildings(conn: &Connection) -> Result<Vec<BuildingRow>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM buildings ORDER BY id")
        .context("failed to prepare building query")?;

    let buildings = stmt
        .query_map([], |row| {
            Ok(BuildingRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load buildings")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect buildings")?;

    Ok(buildings)
}

/// Insert a new building row, returning the hydrated row so the caller can
/// push it straight into the in-memory tree.
pub fn insert_building(conn: &Connection, name: &str) -> Result<BuildingRow> {
    let name = validate_building_name(name)?;
    conn.execute("INSERT INTO buildings (name) VALUES (?1)", params![name])
        .context("failed to insert building")?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %name, "inserted building");
    Ok(BuildingRow { id, name })
}
