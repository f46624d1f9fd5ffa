//! Ratatui front-end. It only presents data and forwards commands: every rule
//! about codes, statuses and ticket numbers is enforced by the desk it wraps.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
