use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::StoreSnapshot;

/// Replace the contents of both tables with `snapshot`. Everything runs in a
/// single transaction: if any insert fails the transaction is dropped
/// without commit and the previous rows stay in place.
pub fn overwrite_all(conn: &mut Connection, snapshot: &StoreSnapshot) -> Result<()> {
    let tx = conn.transaction().context("failed to begin save transaction")?;

    tx.execute("DELETE FROM apartments", [])
        .context("failed to clear apartments")?;
    tx.execute("DELETE FROM buildings", [])
        .context("failed to clear buildings")?;

    {
        let mut insert_building = tx
            .prepare("INSERT INTO buildings (id, name) VALUES (?1, ?2)")
            .context("failed to prepare building insert")?;
        for building in &snapshot.buildings {
            insert_building
                .execute(params![building.id, building.name])
                .with_context(|| format!("failed to save building '{}'", building.name))?;
        }

        let mut insert_apartment = tx
            .prepare(
                "INSERT INTO apartments
                 (id, building_id, number, tenant, email, lease_start, lease_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .context("failed to prepare apartment insert")?;
        for apartment in &snapshot.apartments {
            insert_apartment
                .execute(params![
                    apartment.id,
                    apartment.building_id,
                    apartment.number,
                    apartment.tenant,
                    apartment.email,
                    apartment.lease_start,
                    apartment.lease_end
                ])
                .with_context(|| format!("failed to save apartment '{}'", apartment.number))?;
        }
    }

    tx.commit().context("failed to commit save transaction")?;
    tracing::info!(
        buildings = snapshot.buildings.len(),
        apartments = snapshot.apartments.len(),
        "rewrote property store"
    );
    Ok(())
}
