//! Ratatui front-end: the building/apartment tree, the reminder screen and
//! the modal forms layered over them.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;

#[cfg(test)]
pub(crate) use helpers::surface_error;
