//! Ticket assembly: sequential numbering, reference resolution against the
//! student/faculty/program registries, and validated saves.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::db::{Database, Record, Store};
use crate::error::{DeskError, Result};
use crate::lifecycle::Lifecycle;
use crate::models::{Faculty, Program, SortKey, Status, Student, Ticket, TicketDraft};

const TICKET_PREFIX: char = 'T';
const DATE_FORMAT: &str = "%Y%m%d";

/// The three records a ticket points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct References {
    pub student: Student,
    pub faculty: Faculty,
    pub program: Program,
}

/// Read and status commands for tickets. Tickets are written only through
/// `TicketComposer::compose_and_save`, so this type has no create or edit.
pub struct TicketRegistry {
    engine: Lifecycle<Ticket>,
}

impl TicketRegistry {
    fn new(db: Database) -> Self {
        Self {
            engine: Lifecycle::new(db),
        }
    }

    pub(crate) fn engine(&self) -> &Lifecycle<Ticket> {
        &self.engine
    }

    pub fn list(&self, search: &str, sort: SortKey) -> Result<Vec<Ticket>> {
        self.engine.list(search, sort)
    }

    pub fn get(&self, ticket_number: &str) -> Result<Option<Ticket>> {
        self.engine.get(ticket_number)
    }

    pub fn code_exists(&self, ticket_number: &str) -> Result<bool> {
        self.engine.code_exists(ticket_number)
    }

    pub fn remove(&self, ticket_number: &str) -> Result<()> {
        self.engine.remove(ticket_number)
    }

    pub fn deactivate(&self, ticket_number: &str) -> Result<()> {
        self.engine.deactivate(ticket_number)
    }

    pub fn reactivate(&self, ticket_number: &str) -> Result<()> {
        self.engine.reactivate(ticket_number)
    }
}

pub struct TicketComposer {
    tickets: TicketRegistry,
    students: Store<Student>,
    faculties: Store<Faculty>,
    programs: Store<Program>,
}

impl TicketComposer {
    pub fn new(db: &Database) -> Self {
        Self {
            tickets: TicketRegistry::new(db.clone()),
            students: Store::new(db.clone()),
            faculties: Store::new(db.clone()),
            programs: Store::new(db.clone()),
        }
    }

    pub fn tickets(&self) -> &TicketRegistry {
        &self.tickets
    }

    /// `T` followed by the highest live sequence plus one, zero-padded to four
    /// digits. Removed tickets do not count, so removing the newest ticket
    /// hands its number out again. Fails once the sequence reaches `u64::MAX`.
    pub fn next_ticket_number(&self) -> Result<String> {
        let highest = self
            .tickets
            .engine()
            .store()
            .live_keys()?
            .iter()
            .filter_map(|number| ticket_sequence(number))
            .max();

        match highest {
            None => Ok(format_ticket_number(1)),
            Some(sequence) => match sequence.checked_add(1) {
                Some(next) => Ok(format_ticket_number(next)),
                None => {
                    warn!(last = sequence, "ticket numbers exhausted");
                    Err(DeskError::SequenceExhausted {
                        last: format_ticket_number(sequence),
                    })
                }
            },
        }
    }

    /// Look up all three references, failing on the first one that is absent
    /// or removed. Inactive records still resolve.
    pub fn resolve(
        &self,
        student_code: &str,
        faculty_code: &str,
        program_code: &str,
    ) -> Result<References> {
        Ok(References {
            student: lookup(&self.students, student_code)?,
            faculty: lookup(&self.faculties, faculty_code)?,
            program: lookup(&self.programs, program_code)?,
        })
    }

    /// Validate and persist a ticket. A draft without a number becomes a new
    /// active ticket with the next sequential number; a draft carrying a
    /// number edits that ticket and keeps its status.
    pub fn compose_and_save(&self, draft: TicketDraft) -> Result<Ticket> {
        validate_draft(&draft)?;
        self.resolve(
            draft.student_code.trim(),
            draft.faculty_code.trim(),
            draft.program_code.trim(),
        )?;

        let engine = self.tickets.engine();
        match draft.ticket_number.clone() {
            None => {
                let number = self.next_ticket_number()?;
                debug!(ticket = %number, "assigned ticket number");
                let ticket = engine.create(draft.into_ticket(number, Status::Active))?;
                info!(ticket = %ticket.ticket_number, "opened ticket");
                Ok(ticket)
            }
            Some(number) => engine.modify(draft.into_ticket(number, Status::Active)),
        }
    }
}

/// Numeric part of a ticket number, or `None` when it is not `T` followed by
/// digits. Digit runs too long for `u64` saturate at `u64::MAX`.
pub fn ticket_sequence(number: &str) -> Option<u64> {
    let digits = number.strip_prefix(TICKET_PREFIX).unwrap_or(number);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}

pub fn format_ticket_number(sequence: u64) -> String {
    format!("{TICKET_PREFIX}{sequence:04}")
}

fn lookup<E: Record>(store: &Store<E>, key: &str) -> Result<E> {
    match store.get_by_key(key)? {
        Some(record) if !record.status().is_removed() => Ok(record),
        _ => Err(DeskError::MissingReference {
            kind: E::KIND,
            key: key.to_string(),
        }),
    }
}

fn validate_draft(draft: &TicketDraft) -> Result<()> {
    let required = [
        ("Date", &draft.date),
        ("Student code", &draft.student_code),
        ("Faculty code", &draft.faculty_code),
        ("Program code", &draft.program_code),
        ("Description", &draft.description),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DeskError::blank(field));
        }
    }

    if let Some(number) = &draft.ticket_number {
        if number.trim().is_empty() {
            return Err(DeskError::blank("Ticket number"));
        }
    }

    validate_date(draft.date.trim())
}

/// Dates are eight digits, `YYYYMMDD`, naming a real calendar day.
fn validate_date(date: &str) -> Result<()> {
    let well_formed = date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit());
    if well_formed && NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok() {
        Ok(())
    } else {
        Err(DeskError::Validation {
            field: "Date",
            reason: format!("must be a valid YYYYMMDD date, got `{date}`"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Named;

    fn composer() -> TicketComposer {
        let db = Database::open_in_memory().unwrap();
        let composer = TicketComposer::new(&db);
        Lifecycle::<Faculty>::new(db.clone())
            .create(Faculty::new("17", "FIPS"))
            .unwrap();
        Lifecycle::<Program>::new(db.clone())
            .create(Program::new("70", "Industrial"))
            .unwrap();
        Lifecycle::<Student>::new(db)
            .create(Student::new("2020001", "Juan Pérez"))
            .unwrap();
        composer
    }

    fn draft(description: &str) -> TicketDraft {
        TicketDraft {
            ticket_number: None,
            date: "20240115".into(),
            student_code: "2020001".into(),
            faculty_code: "17".into(),
            program_code: "70".into(),
            description: description.into(),
        }
    }

    fn insert_raw(composer: &TicketComposer, number: &str) {
        composer
            .tickets()
            .engine()
            .store()
            .insert(&draft("raw").into_ticket(number.into(), Status::Active))
            .unwrap();
    }

    #[test]
    fn numbering_starts_at_one() {
        assert_eq!(composer().next_ticket_number().unwrap(), "T0001");
    }

    #[test]
    fn numbering_follows_the_live_maximum() {
        let composer = composer();
        for sequence in 1..=9 {
            insert_raw(&composer, &format_ticket_number(sequence));
        }
        assert_eq!(composer.next_ticket_number().unwrap(), "T0010");

        composer.tickets().remove("T0009").unwrap();
        assert_eq!(composer.next_ticket_number().unwrap(), "T0009");
    }

    #[test]
    fn numbering_is_numeric_not_lexicographic() {
        let composer = composer();
        insert_raw(&composer, "T9999");
        insert_raw(&composer, "T10000");
        insert_raw(&composer, "T004");
        assert_eq!(composer.next_ticket_number().unwrap(), "T10001");
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        assert_eq!(ticket_sequence("T0042"), Some(42));
        assert_eq!(ticket_sequence("0042"), Some(42));
        assert_eq!(ticket_sequence("TX1"), None);
        assert_eq!(ticket_sequence("T"), None);
        assert_eq!(ticket_sequence("T4294967296"), Some(4_294_967_296));

        let composer = composer();
        insert_raw(&composer, "legacy");
        assert_eq!(composer.next_ticket_number().unwrap(), "T0001");
    }

    #[test]
    fn numbering_runs_past_u32() {
        let composer = composer();
        insert_raw(&composer, "T4294967295");
        assert_eq!(composer.next_ticket_number().unwrap(), "T4294967296");

        insert_raw(&composer, "T4294967296");
        assert_eq!(composer.next_ticket_number().unwrap(), "T4294967297");
    }

    #[test]
    fn exhausted_sequence_is_an_error() {
        let composer = composer();
        insert_raw(&composer, &format_ticket_number(u64::MAX));
        let err = composer.next_ticket_number().unwrap_err();
        assert!(matches!(err, DeskError::SequenceExhausted { .. }));

        let err = composer.compose_and_save(draft("test")).unwrap_err();
        assert!(matches!(err, DeskError::SequenceExhausted { .. }));

        composer.tickets().remove(&format_ticket_number(u64::MAX)).unwrap();
        insert_raw(&composer, "T99999999999999999999999");
        assert!(composer.next_ticket_number().is_err());
    }

    #[test]
    fn resolve_names_the_first_missing_reference() {
        let composer = composer();
        let refs = composer.resolve("2020001", "17", "70").unwrap();
        assert_eq!(refs.student.name(), "Juan Pérez");
        assert_eq!(refs.faculty.name(), "FIPS");
        assert_eq!(refs.program.name(), "Industrial");

        let err = composer.resolve("2020001", "99", "98").unwrap_err();
        assert!(matches!(
            err,
            DeskError::MissingReference { kind: crate::models::EntityKind::Faculty, ref key } if key == "99"
        ));
    }

    #[test]
    fn removed_references_are_missing_but_inactive_ones_resolve() {
        let composer = composer();
        composer.faculties.set_status("17", Status::Inactive).unwrap();
        assert!(composer.resolve("2020001", "17", "70").is_ok());

        composer.programs.set_status("70", Status::Removed).unwrap();
        assert!(matches!(
            composer.resolve("2020001", "17", "70").unwrap_err(),
            DeskError::MissingReference { .. }
        ));
    }

    #[test]
    fn compose_creates_the_first_ticket() {
        let composer = composer();
        let ticket = composer.compose_and_save(draft("test")).unwrap();

        assert_eq!(ticket.ticket_number, "T0001");
        assert_eq!(ticket.status, Status::Active);
        assert_eq!(composer.tickets().get("T0001").unwrap(), Some(ticket));

        let second = composer.compose_and_save(draft("otro")).unwrap();
        assert_eq!(second.ticket_number, "T0002");
    }

    #[test]
    fn compose_edits_keep_number_and_status() {
        let composer = composer();
        composer.compose_and_save(draft("test")).unwrap();
        composer.tickets().deactivate("T0001").unwrap();

        let mut edit = draft("corrected");
        edit.ticket_number = Some("T0001".into());
        let saved = composer.compose_and_save(edit).unwrap();

        assert_eq!(saved.ticket_number, "T0001");
        assert_eq!(saved.status, Status::Inactive);
        assert_eq!(saved.description, "corrected");
        assert_eq!(composer.next_ticket_number().unwrap(), "T0002");
    }

    #[test]
    fn compose_rejects_bad_drafts_without_writing() {
        let composer = composer();

        let err = composer.compose_and_save(draft("   ")).unwrap_err();
        assert!(matches!(err, DeskError::Validation { field: "Description", .. }));

        let mut bad_date = draft("test");
        bad_date.date = "20240230".into();
        let err = composer.compose_and_save(bad_date).unwrap_err();
        assert!(matches!(err, DeskError::Validation { field: "Date", .. }));

        let mut missing = draft("test");
        missing.student_code = "2020999".into();
        let err = composer.compose_and_save(missing).unwrap_err();
        assert!(matches!(err, DeskError::MissingReference { .. }));

        let mut unknown = draft("test");
        unknown.ticket_number = Some("T0042".into());
        let err = composer.compose_and_save(unknown).unwrap_err();
        assert!(matches!(err, DeskError::NotFound { .. }));

        assert!(composer.tickets().list("", Default::default()).unwrap().is_empty());
    }

    #[test]
    fn edits_to_a_removed_ticket_are_not_found() {
        let composer = composer();
        composer.compose_and_save(draft("test")).unwrap();
        composer.tickets().remove("T0001").unwrap();

        let mut edit = draft("revived");
        edit.ticket_number = Some("T0001".into());
        let err = composer.compose_and_save(edit).unwrap_err();
        assert!(matches!(err, DeskError::NotFound { ref key, .. } if key == "T0001"));

        let stored = composer.tickets().get("T0001").unwrap().unwrap();
        assert_eq!(stored.status, Status::Removed);
        assert_eq!(stored.description, "test");
    }

    #[test]
    fn draft_fields_are_trimmed_before_saving() {
        let composer = composer();
        let mut padded = draft(" test ");
        padded.student_code = " 2020001 ".into();
        padded.date = "20240115 ".into();

        let ticket = composer.compose_and_save(padded).unwrap();
        assert_eq!(ticket.student_code, "2020001");
        assert_eq!(ticket.date, "20240115");
        assert_eq!(ticket.description, "test");
    }

    #[test]
    fn date_validation_requires_eight_digits() {
        assert!(validate_date("20240115").is_ok());
        assert!(validate_date("2024115").is_err());
        assert!(validate_date("2024-01-15").is_err());
        assert!(validate_date("20241301").is_err());
    }
}
