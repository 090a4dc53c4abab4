//! Persistence module split across logical submodules.

mod apartments;
mod buildings;
mod connection;
mod snapshot;

pub use apartments::{insert_apartment, list_apartments};
pub use buildings::{insert_building, list_buildings};
pub use connection::{create_schema, data_dir, open_store, DB_FILE_NAME};
pub use snapshot::overwrite_all;
