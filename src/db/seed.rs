use anyhow::{Context, Result};
use tracing::info;

use super::connection::Database;
use super::store::Store;
use crate::models::{Faculty, Program, Status, Student, Ticket};

const FACULTIES: &[(&str, &str)] = &[
    ("17", "FIPS"),
    ("18", "Educación"),
    ("19", "Ciencias"),
    ("20", "Ingeniería Civil"),
];

const PROGRAMS: &[(&str, &str)] = &[
    ("70", "Industrial"),
    ("71", "Sistemas"),
    ("72", "Telecomunicaciones"),
    ("73", "Mecánica"),
    ("74", "Electrónica"),
];

const STUDENTS: &[(&str, &str)] = &[
    ("2020001", "Juan Pérez López"),
    ("2020002", "María García Ruiz"),
    ("2020003", "Carlos Mendoza Silva"),
    ("2020004", "Ana Torres Vargas"),
    ("2020005", "Luis Ramos Castro"),
];

/// (number, date, student, faculty, program, description)
const TICKETS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("T0001", "20240115", "2020001", "17", "71", "Solicitud de constancia de estudios"),
    ("T0002", "20240116", "2020002", "18", "70", "Revisión de notas del semestre"),
    ("T0003", "20240117", "2020003", "17", "72", "Cambio de horario de clases"),
    ("T0004", "20240118", "2020004", "19", "73", "Solicitud de beca académica"),
];

/// Populate a brand-new database with the demo registries. Nothing happens
/// when any table already holds rows, so user data is never overwritten.
/// Returns whether the seed ran.
pub fn seed_demo_data(db: &Database) -> Result<bool> {
    let faculties: Store<Faculty> = Store::new(db.clone());
    let programs: Store<Program> = Store::new(db.clone());
    let students: Store<Student> = Store::new(db.clone());
    let tickets: Store<Ticket> = Store::new(db.clone());

    let existing =
        faculties.count()? + programs.count()? + students.count()? + tickets.count()?;
    if existing > 0 {
        return Ok(false);
    }

    let tx = db
        .conn()
        .unchecked_transaction()
        .context("failed to start seed transaction")?;

    for (code, name) in FACULTIES {
        faculties.insert(&Faculty::new(*code, *name))?;
    }
    for (code, name) in PROGRAMS {
        programs.insert(&Program::new(*code, *name))?;
    }
    for (code, name) in STUDENTS {
        students.insert(&Student::new(*code, *name))?;
    }
    for (number, date, student, faculty, program, description) in TICKETS {
        tickets.insert(&Ticket {
            ticket_number: number.to_string(),
            date: date.to_string(),
            student_code: student.to_string(),
            faculty_code: faculty.to_string(),
            program_code: program.to_string(),
            description: description.to_string(),
            status: Status::Active,
        })?;
    }

    tx.commit().context("failed to commit seed data")?;
    info!(
        faculties = FACULTIES.len(),
        programs = PROGRAMS.len(),
        students = STUDENTS.len(),
        tickets = TICKETS.len(),
        "seeded demo data"
    );
    Ok(true)
}
