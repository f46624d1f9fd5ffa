//! End-to-end scenarios against an on-disk database.

use tempfile::TempDir;
use ticket_desk::{
    Config, Desk, DeskError, Faculty, Program, SortKey, Status, Student, TicketDraft,
    TicketRegistry,
};

fn config(dir: &TempDir, seed: bool) -> Config {
    Config {
        db_path: dir.path().join("data").join("tickets.sqlite"),
        log_path: dir.path().join("ticket-desk.log"),
        seed_demo_data: seed,
    }
}

fn empty_desk(dir: &TempDir) -> Desk {
    Desk::open(&config(dir, false)).unwrap()
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

fn register_references(desk: &Desk) {
    desk.faculties().create(Faculty::new("17", "FIPS")).unwrap();
    desk.programs().create(Program::new("70", "Industrial")).unwrap();
    desk.students()
        .create(Student::new("2020001", "Juan Pérez"))
        .unwrap();
}

#[test]
fn first_ticket_gets_number_one() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    register_references(&desk);

    let ticket = desk.composer().compose_and_save(draft("test")).unwrap();
    assert_eq!(ticket.ticket_number, "T0001");
    assert_eq!(ticket.status, Status::Active);

    let listed = desk.tickets().list("", SortKey::Code).unwrap();
    assert_eq!(listed, vec![ticket]);
}

#[test]
fn search_matches_codes_and_names() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    desk.faculties().create(Faculty::new("17", "FIPS")).unwrap();
    desk.faculties().create(Faculty::new("18", "Educación")).unwrap();
    desk.faculties().create(Faculty::new("20", "Rama 17")).unwrap();

    let codes: Vec<_> = desk
        .faculties()
        .list("17", SortKey::Natural)
        .unwrap()
        .into_iter()
        .map(|f| f.code)
        .collect();
    assert_eq!(codes, ["17", "20"]);

    assert!(desk.faculties().list("%", SortKey::Code).unwrap().is_empty());
}

#[test]
fn removed_records_vanish_and_free_their_code() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    register_references(&desk);

    desk.programs().remove("70").unwrap();
    assert!(desk.programs().list("", SortKey::Code).unwrap().is_empty());
    assert!(!desk.programs().code_exists("70").unwrap());

    let err = desk.composer().compose_and_save(draft("test")).unwrap_err();
    assert!(matches!(err, DeskError::MissingReference { .. }));
    assert_eq!(err.to_string(), "Program 70 does not exist");

    desk.programs()
        .create(Program::new("70", "Industrial II"))
        .unwrap();
    assert!(desk.composer().compose_and_save(draft("test")).is_ok());
}

#[test]
fn data_survives_reopening() {
    let dir = TempDir::new().unwrap();
    {
        let desk = empty_desk(&dir);
        register_references(&desk);
        desk.composer().compose_and_save(draft("test")).unwrap();
        desk.students().deactivate("2020001").unwrap();
    }

    let desk = empty_desk(&dir);
    let student = desk.students().get("2020001").unwrap().unwrap();
    assert_eq!(student.status, Status::Inactive);
    assert_eq!(desk.composer().next_ticket_number().unwrap(), "T0002");

    // Inactive references still resolve.
    let ticket = desk.composer().compose_and_save(draft("otro")).unwrap();
    assert_eq!(ticket.ticket_number, "T0002");
}

#[test]
fn demo_data_is_seeded_once() {
    let dir = TempDir::new().unwrap();
    {
        let desk = Desk::open(&config(&dir, true)).unwrap();
        assert_eq!(desk.faculties().list("", SortKey::Code).unwrap().len(), 4);
        desk.faculties().remove("17").unwrap();
    }

    let desk = Desk::open(&config(&dir, true)).unwrap();
    assert_eq!(desk.faculties().list("", SortKey::Code).unwrap().len(), 3);
    assert_eq!(desk.composer().next_ticket_number().unwrap(), "T0005");
}

#[test]
fn writes_bump_the_database_revision() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    let before = desk.database().revision();

    desk.faculties().create(Faculty::new("17", "FIPS")).unwrap();
    let after_create = desk.database().revision();
    assert!(after_create > before);

    assert!(desk.faculties().create(Faculty::new("17", "Otra")).is_err());
    assert_eq!(desk.database().revision(), after_create);
}

// `TicketRegistry` has no create or edit command, so the composer's checks
// run for every ticket written through the public API.
#[test]
fn tickets_are_only_written_through_the_composer() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    register_references(&desk);
    let registry: &TicketRegistry = desk.tickets();

    let mut dangling = draft("test");
    dangling.student_code = "nobody".into();
    let err = desk.composer().compose_and_save(dangling).unwrap_err();
    assert!(matches!(err, DeskError::MissingReference { .. }));

    let mut bad_date = draft("test");
    bad_date.date = "notadate".into();
    assert!(desk.composer().compose_and_save(bad_date).is_err());

    let mut chosen_number = draft("test");
    chosen_number.ticket_number = Some("ZZZ".into());
    let err = desk.composer().compose_and_save(chosen_number).unwrap_err();
    assert!(matches!(err, DeskError::NotFound { .. }));

    assert!(registry.list("", SortKey::Code).unwrap().is_empty());
    assert!(!registry.code_exists("ZZZ").unwrap());
}

#[test]
fn editing_a_removed_ticket_is_not_found() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    register_references(&desk);
    desk.composer().compose_and_save(draft("test")).unwrap();
    desk.tickets().remove("T0001").unwrap();

    let mut edit = draft("edited");
    edit.ticket_number = Some("T0001".into());
    let err = desk.composer().compose_and_save(edit).unwrap_err();
    assert!(matches!(err, DeskError::NotFound { ref key, .. } if key == "T0001"));

    let stored = desk.tickets().get("T0001").unwrap().unwrap();
    assert_eq!(stored.status, Status::Removed);
    assert_eq!(stored.description, "test");
}

#[test]
fn padded_codes_name_the_same_record() {
    let dir = TempDir::new().unwrap();
    let desk = empty_desk(&dir);
    desk.faculties().create(Faculty::new(" 17", "FIPS ")).unwrap();

    let err = desk
        .faculties()
        .create(Faculty::new("17", "Otra"))
        .unwrap_err();
    assert!(matches!(err, DeskError::DuplicateKey { .. }));

    let stored = desk.faculties().get("17").unwrap().unwrap();
    assert_eq!(stored, Faculty::new("17", "FIPS"));
    desk.faculties().deactivate(" 17 ").unwrap();
    assert_eq!(desk.faculties().list("", SortKey::Code).unwrap().len(), 1);
}
