//! Core library surface for the Lease Navigator TUI: rental buildings, their
//! apartments and tenants, persisted in SQLite, with emailed lease-expiration
//! reminders.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod reminder;
pub mod sync;
pub mod ui;

/// Persistence entry points used by `main.rs` to open the store.
pub use db::{data_dir, open_store};

pub use config::AppConfig;
pub use error::LeaseError;
pub use models::{Apartment, ApartmentDraft, Building};
pub use sync::{load_portfolio, save_portfolio};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
