use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode};

use crate::models::{ApartmentDraft, ApartmentRow};

/// Get every apartment owned by one building, in insertion order.
pub fn list_apartments(conn: &Connection, building_id: i64) -> Result<Vec<ApartmentRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, building_id, number, tenant, email, lease_start, lease_end
             FROM apartments
             WHERE building_id = ?1
             ORDER BY id",
        )
        .context("failed to prepare apartment query")?;

    let apartments = stmt
        .query_map([building_id], |row| {
            Ok(ApartmentRow {
                id: row.get(0)?,
                building_id: row.get(1)?,
                number: row.get(2)?,
                tenant: row.get(3)?,
                email: row.get(4)?,
                lease_start: row.get(5)?,
                lease_end: row.get(6)?,
            })
        })
        .context("failed to iterate apartments")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect apartments")?;

    Ok(apartments)
}

/// Validate and insert an apartment under `building_id`.
pub fn insert_apartment(
    conn: &Connection,
    building_id: i64,
    draft: ApartmentDraft,
) -> Result<ApartmentRow> {
    let draft = draft.validate()?;
    conn.execute(
        "INSERT INTO apartments (building_id, number, tenant, email, lease_start, lease_end)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            building_id,
            draft.number,
            draft.tenant,
            draft.email,
            draft.lease_start,
            draft.lease_end
        ],
    )
    .map_err(map_missing_building)
    .context("failed to insert apartment")?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, building_id, number = %draft.number, "inserted apartment");
    Ok(ApartmentRow {
        id,
        building_id,
        number: draft.number,
        tenant: draft.tenant,
        email: draft.email,
        lease_start: draft.lease_start,
        lease_end: draft.lease_end,
    })
}

/// The only constraint an apartment insert can trip is the building
/// foreign key.
fn map_missing_building(err: SqlError) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        anyhow!("Building not found.")
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_schema, insert_building};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    fn draft(number: &str) -> ApartmentDraft {
        ApartmentDraft {
            number: number.into(),
            tenant: "J. Doe".into(),
            email: "j@x.com".into(),
            lease_start: "01/01/2024".into(),
            lease_end: "12/31/2024".into(),
        }
    }

    #[test]
    fn apartments_are_listed_per_building() {
        let conn = store();
        let oak = insert_building(&conn, "Oak Hall").unwrap();
        let elm = insert_building(&conn, "Elm Court").unwrap();
        let first = insert_apartment(&conn, oak.id, draft("1A")).unwrap();
        insert_apartment(&conn, elm.id, draft("7")).unwrap();
        let second = insert_apartment(&conn, oak.id, draft("1B")).unwrap();

        assert_eq!(list_apartments(&conn, oak.id).unwrap(), vec![first, second]);
        assert_eq!(list_apartments(&conn, elm.id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_building_is_reported() {
        let conn = store();
        let err = insert_apartment(&conn, 42, draft("1A")).unwrap_err();
        assert_eq!(crate::ui::surface_error(&err), "Building not found.");
    }

    #[test]
    fn invalid_draft_writes_nothing() {
        let conn = store();
        let oak = insert_building(&conn, "Oak Hall").unwrap();
        let mut blank = draft("1A");
        blank.tenant.clear();
        assert!(insert_apartment(&conn, oak.id, blank).is_err());
        assert!(list_apartments(&conn, oak.id).unwrap().is_empty());
    }
}
