use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".lease-navigator";
/// SQLite file name stored inside the application data directory.
pub const DB_FILE_NAME: &str = "property_manager.db";

/// Open (or create) the database at `path`, make sure its parent directory
/// exists, and bring the schema up.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    create_schema(&conn)?;
    tracing::info!(path = %path.display(), "opened property store");
    Ok(conn)
}

/// Create both tables when missing. Also toggles `PRAGMA foreign_keys = ON`
/// so deleting a building cascades to its apartments.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS buildings (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create buildings table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS apartments (
            id INTEGER PRIMARY KEY,
            building_id INTEGER NOT NULL,
            number TEXT NOT NULL,
            tenant TEXT NOT NULL,
            email TEXT NOT NULL,
            lease_start TEXT NOT NULL,
            lease_end TEXT NOT NULL,
            FOREIGN KEY(building_id) REFERENCES buildings(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create apartments table")?;

    Ok(())
}

/// Resolve the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        create_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["apartments", "buildings"]);
    }

    #[test]
    fn open_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DB_FILE_NAME);
        open_store(&path).unwrap();
        assert!(path.exists());
    }
}
