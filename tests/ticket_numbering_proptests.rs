//! Property-based tests for ticket numbering.

use proptest::prelude::*;
use ticket_desk::composer::{format_ticket_number, ticket_sequence};
use ticket_desk::{Database, Desk, Faculty, Program, Student, TicketDraft};

fn desk_with_references() -> Desk {
    let desk = Desk::new(Database::open_in_memory().unwrap());
    desk.faculties().create(Faculty::new("17", "FIPS")).unwrap();
    desk.programs().create(Program::new("70", "Industrial")).unwrap();
    desk.students()
        .create(Student::new("2020001", "Juan Pérez"))
        .unwrap();
    desk
}

fn draft() -> TicketDraft {
    TicketDraft {
        ticket_number: None,
        date: "20240115".into(),
        student_code: "2020001".into(),
        faculty_code: "17".into(),
        program_code: "70".into(),
        description: "generated".into(),
    }
}

proptest! {
    #[test]
    fn prop_sequence_round_trips(sequence in any::<u64>()) {
        prop_assert_eq!(ticket_sequence(&format_ticket_number(sequence)), Some(sequence));
    }

    // The next number is one past the highest ticket that is not removed,
    // whichever tickets were removed along the way.
    #[test]
    fn prop_next_number_follows_live_maximum(
        removed_mask in prop::collection::vec(any::<bool>(), 0..15),
    ) {
        let desk = desk_with_references();
        for _ in &removed_mask {
            desk.composer().compose_and_save(draft()).unwrap();
        }

        let mut live_max = 0u64;
        for (idx, removed) in removed_mask.iter().enumerate() {
            let sequence = idx as u64 + 1;
            if *removed {
                desk.tickets().remove(&format_ticket_number(sequence)).unwrap();
            } else {
                live_max = sequence;
            }
        }

        prop_assert_eq!(
            desk.composer().next_ticket_number().unwrap(),
            format_ticket_number(live_max + 1)
        );
    }
}
