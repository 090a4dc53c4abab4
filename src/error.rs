//! User-facing failures that abort an operation before anything is written
//! or sent. Store and startup failures travel as `anyhow::Error` with
//! context instead; both end up in the status footer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaseError {
    #[error("Building name cannot be empty.")]
    EmptyBuildingName,

    #[error("{0} cannot be empty.")]
    MissingField(&'static str),

    #[error("{field} must be a date like MM/DD/YYYY (got '{value}').")]
    InvalidDate { field: &'static str, value: String },

    #[error("Lease end {end} is before lease start {start}.")]
    LeaseEndsBeforeStart { start: String, end: String },

    #[error("{building}, {apartment}: {reason}")]
    InvalidApartment {
        building: String,
        apartment: String,
        reason: Box<LeaseError>,
    },

    #[error("Please select a building.")]
    NoBuildingSelected,

    #[error("Please select an apartment.")]
    NoApartmentSelected,

    #[error("Sender credentials are missing. Press 'L' to log in.")]
    MissingCredentials,

    #[error("Attachment not found: {}", .0.display())]
    AttachmentNotFound(PathBuf),

    #[error("An error occurred while sending the email: {0}")]
    Mail(String),
}
