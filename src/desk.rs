//! The command/query surface consumed by the front-end: one lifecycle engine
//! per coded registry plus the ticket composer, all sharing one database.
//! The composer is the only way to write a ticket.

use anyhow::Result;
use tracing::info;

use crate::composer::{TicketComposer, TicketRegistry};
use crate::config::Config;
use crate::db::{seed_demo_data, Database};
use crate::lifecycle::Lifecycle;
use crate::models::{Faculty, Program, Student};

pub struct Desk {
    db: Database,
    faculties: Lifecycle<Faculty>,
    programs: Lifecycle<Program>,
    students: Lifecycle<Student>,
    composer: TicketComposer,
}

impl Desk {
    pub fn new(db: Database) -> Self {
        Self {
            faculties: Lifecycle::new(db.clone()),
            programs: Lifecycle::new(db.clone()),
            students: Lifecycle::new(db.clone()),
            composer: TicketComposer::new(&db),
            db,
        }
    }

    /// Open the configured database, seeding it on first run when enabled.
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open(&config.db_path)?;
        if config.seed_demo_data && seed_demo_data(&db)? {
            info!(path = %config.db_path.display(), "initialized new database");
        }
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn faculties(&self) -> &Lifecycle<Faculty> {
        &self.faculties
    }

    pub fn programs(&self) -> &Lifecycle<Program> {
        &self.programs
    }

    pub fn students(&self) -> &Lifecycle<Student> {
        &self.students
    }

    /// Tickets are read and status-changed here; they are saved through
    /// `composer()`.
    pub fn tickets(&self) -> &TicketRegistry {
        self.composer.tickets()
    }

    pub fn composer(&self) -> &TicketComposer {
        &self.composer
    }
}
