//! Record-management core for the faculty/program/student/ticket desk.
//!
//! The persistence layer (`db`) stores the four registries in SQLite; the
//! lifecycle engine and the ticket composer enforce the rules on top of it;
//! `projection` turns a search/sort pair into a live list; `ui` is the
//! terminal front-end that drives all of it.
pub mod composer;
pub mod config;
pub mod db;
pub mod desk;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod projection;
pub mod ui;

pub use composer::{References, TicketComposer, TicketRegistry};
pub use config::Config;
pub use db::{Database, Record};
pub use desk::Desk;
pub use error::DeskError;
pub use lifecycle::Lifecycle;
pub use logging::init_logging;
pub use models::{
    EntityKind, Faculty, Named, Program, SortKey, Status, Student, Ticket, TicketDraft,
};
pub use projection::{Projection, RowSource};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
