//! Persistence layer around the embedded SQLite database, split into the
//! connection handle, the per-entity table mapping, the generic store and the
//! first-run seed.

mod connection;
mod record;
mod seed;
mod store;

pub use connection::{ensure_schema, Database};
pub use record::Record;
pub use seed::seed_demo_data;
pub(crate) use store::Store;
