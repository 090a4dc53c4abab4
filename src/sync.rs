//! Conversion between the in-memory property tree and the table rows, plus
//! the load and save flows built on top of it.
//!
//! `from_store` and `to_store` are pure so the round trip can be checked
//! without a database. `to_store` numbers rows by tree position, which means
//! an apartment's `building_id` always follows its parent node, even after
//! the building was renamed or another building with the same name exists.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{list_apartments, list_buildings, overwrite_all};
use crate::error::LeaseError;
use crate::models::{
    validate_building_name, Apartment, ApartmentRow, Building, BuildingRow, StoreSnapshot,
};

/// Build the tree from table rows, keeping store order for both levels.
pub fn from_store(snapshot: StoreSnapshot) -> Vec<Building> {
    let mut buildings: Vec<Building> = snapshot
        .buildings
        .into_iter()
        .map(|row| Building::new(row.id, row.name))
        .collect();
    let positions: HashMap<i64, usize> = buildings
        .iter()
        .enumerate()
        .map(|(idx, building)| (building.id, idx))
        .collect();

    for row in snapshot.apartments {
        match positions.get(&row.building_id) {
            Some(&idx) => buildings[idx].apartments.push(row.into()),
            None => tracing::warn!(
                apartment_id = row.id,
                building_id = row.building_id,
                "dropping apartment whose building no longer exists"
            ),
        }
    }

    buildings
}

/// Flatten the tree into rows with fresh sequential ids.
pub fn to_store(buildings: &[Building]) -> StoreSnapshot {
    let mut snapshot = StoreSnapshot::default();
    let mut next_apartment_id = 1;

    for (building_id, building) in (1i64..).zip(buildings) {
        snapshot.buildings.push(BuildingRow {
            id: building_id,
            name: building.name.clone(),
        });
        for apartment in &building.apartments {
            snapshot.apartments.push(ApartmentRow {
                id: next_apartment_id,
                building_id,
                number: apartment.number.clone(),
                tenant: apartment.tenant.clone(),
                email: apartment.email.clone(),
                lease_start: apartment.lease_start.clone(),
                lease_end: apartment.lease_end.clone(),
            });
            next_apartment_id += 1;
        }
    }

    snapshot
}

/// Read every building, then each building's apartments, and materialise
/// the tree.
pub fn load_portfolio(conn: &Connection) -> Result<Vec<Building>> {
    let buildings = list_buildings(conn)?;
    let mut apartments = Vec::new();
    for building in &buildings {
        apartments.extend(list_apartments(conn, building.id)?);
    }

    let tree = from_store(StoreSnapshot {
        buildings,
        apartments,
    });
    tracing::info!(
        buildings = tree.len(),
        apartments = tree.iter().map(|b| b.apartments.len()).sum::<usize>(),
        "loaded property tree"
    );
    Ok(tree)
}

/// Validate the whole tree, rewrite the store from it, and return the tree as
/// reloaded from the store (with the new ids). Nothing is written when any
/// building or apartment fails validation.
pub fn save_portfolio(conn: &mut Connection, buildings: &[Building]) -> Result<Vec<Building>> {
    let mut validated = Vec::with_capacity(buildings.len());
    for building in buildings {
        let mut checked = Building::new(building.id, validate_building_name(&building.name)?);
        for apartment in &building.apartments {
            let draft = apartment.to_draft().validate().map_err(|reason| {
                LeaseError::InvalidApartment {
                    building: checked.name.clone(),
                    apartment: apartment.label(),
                    reason: Box::new(reason),
                }
            })?;
            checked
                .apartments
                .push(Apartment::from_draft(apartment.id, draft));
        }
        validated.push(checked);
    }

    overwrite_all(conn, &to_store(&validated))?;
    load_portfolio(conn)
}
