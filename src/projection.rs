//! A list view driven by `(search text, sort key)`.
//!
//! Every input change bumps a generation counter. A recomputation is started
//! with `begin`, which snapshots the inputs together with the generation, and
//! finished with `complete`; only the result for the newest generation is
//! accepted, so a late answer to an old query can never overwrite the answer
//! to a newer one. Writes are picked up through the database revision.

use tracing::debug;

use crate::composer::TicketRegistry;
use crate::db::Record;
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::models::{SortKey, Ticket};

/// Anything a projection can read rows from.
pub trait RowSource<E> {
    /// Write revision of the underlying database.
    fn revision(&self) -> u64;
    fn rows(&self, search: &str, sort: SortKey) -> Result<Vec<E>>;
}

impl<E: Record> RowSource<E> for Lifecycle<E> {
    fn revision(&self) -> u64 {
        Lifecycle::revision(self)
    }

    fn rows(&self, search: &str, sort: SortKey) -> Result<Vec<E>> {
        self.list(search, sort)
    }
}

impl RowSource<Ticket> for TicketRegistry {
    fn revision(&self) -> u64 {
        self.engine().revision()
    }

    fn rows(&self, search: &str, sort: SortKey) -> Result<Vec<Ticket>> {
        self.list(search, sort)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub sort: SortKey,
}

/// A snapshot of the inputs handed to whoever computes the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub generation: u64,
    pub query: Query,
}

pub struct Projection<E> {
    query: Query,
    generation: u64,
    applied: Option<u64>,
    seen_revision: Option<u64>,
    rows: Vec<E>,
}

impl<E> Default for Projection<E> {
    fn default() -> Self {
        Self {
            query: Query::default(),
            generation: 0,
            applied: None,
            seen_revision: None,
            rows: Vec::new(),
        }
    }
}

impl<E: Record> Projection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.query.search {
            self.query.search = search;
            self.generation += 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        if sort != self.query.sort {
            self.query.sort = sort;
            self.generation += 1;
        }
    }

    pub fn begin(&self) -> Request {
        Request {
            generation: self.generation,
            query: self.query.clone(),
        }
    }

    /// Publish rows computed for `generation`. Returns `false` and drops the
    /// rows when a newer request has been made since.
    pub fn complete(&mut self, generation: u64, rows: Vec<E>) -> bool {
        if generation != self.generation {
            debug!(
                kind = %E::KIND,
                stale = generation,
                latest = self.generation,
                "discarded superseded projection result"
            );
            return false;
        }
        self.rows = rows;
        self.applied = Some(generation);
        true
    }

    /// Re-derive the rows from `source` when the inputs or the underlying
    /// data changed since the last published result. Returns whether new rows
    /// were published.
    pub fn refresh(&mut self, source: &impl RowSource<E>) -> Result<bool> {
        let revision = source.revision();
        if self.applied == Some(self.generation) && self.seen_revision == Some(revision) {
            return Ok(false);
        }

        let request = self.begin();
        let rows = source.rows(&request.query.search, request.query.sort)?;
        self.seen_revision = Some(revision);
        Ok(self.complete(request.generation, rows))
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::TicketComposer;
    use crate::db::Database;
    use crate::models::Faculty;

    fn seeded() -> Lifecycle<Faculty> {
        let engine = Lifecycle::new(Database::open_in_memory().unwrap());
        engine.create(Faculty::new("19", "Ciencias")).unwrap();
        engine.create(Faculty::new("17", "FIPS")).unwrap();
        engine.create(Faculty::new("18", "Educación")).unwrap();
        engine
    }

    fn codes(projection: &Projection<Faculty>) -> Vec<&str> {
        projection.rows().iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn refresh_follows_inputs() {
        let engine = seeded();
        let mut projection = Projection::new();

        assert!(projection.refresh(&engine).unwrap());
        assert_eq!(codes(&projection), ["17", "18", "19"]);

        projection.set_sort(SortKey::Natural);
        assert!(projection.refresh(&engine).unwrap());
        assert_eq!(codes(&projection), ["19", "18", "17"]);

        projection.set_search("FIPS");
        assert!(projection.refresh(&engine).unwrap());
        assert_eq!(codes(&projection), ["17"]);

        assert!(!projection.refresh(&engine).unwrap());
    }

    #[test]
    fn refresh_picks_up_writes() {
        let engine = seeded();
        let mut projection = Projection::new();
        projection.refresh(&engine).unwrap();

        engine.remove("18").unwrap();
        assert!(projection.refresh(&engine).unwrap());
        assert_eq!(codes(&projection), ["17", "19"]);
    }

    #[test]
    fn tickets_refresh_through_their_registry() {
        let db = Database::open_in_memory().unwrap();
        crate::db::seed_demo_data(&db).unwrap();
        let composer = TicketComposer::new(&db);
        let mut projection: Projection<Ticket> = Projection::new();

        assert!(projection.refresh(composer.tickets()).unwrap());
        assert_eq!(projection.rows().len(), 4);

        composer.tickets().remove("T0002").unwrap();
        assert!(projection.refresh(composer.tickets()).unwrap());
        let numbers: Vec<_> = projection
            .rows()
            .iter()
            .map(|t| t.ticket_number.as_str())
            .collect();
        assert_eq!(numbers, ["T0001", "T0003", "T0004"]);
    }

    #[test]
    fn stale_results_are_discarded() {
        let engine = seeded();
        let mut projection = Projection::new();

        projection.set_search("17");
        let first = projection.begin();
        projection.set_search("18");
        let second = projection.begin();
        assert!(second.generation > first.generation);

        let second_rows = engine
            .list(&second.query.search, second.query.sort)
            .unwrap();
        let first_rows = engine.list(&first.query.search, first.query.sort).unwrap();

        assert!(projection.complete(second.generation, second_rows));
        assert!(!projection.complete(first.generation, first_rows));
        assert_eq!(codes(&projection), ["18"]);
    }

    #[test]
    fn unchanged_inputs_do_not_bump_the_generation() {
        let mut projection: Projection<Faculty> = Projection::new();
        projection.set_search("");
        projection.set_sort(SortKey::Code);
        assert_eq!(projection.generation(), 0);

        projection.set_search("x");
        projection.set_search("x");
        assert_eq!(projection.generation(), 1);
    }
}
