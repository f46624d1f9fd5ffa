use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

use crate::models::{EntityKind, Faculty, Program, Status, Student, Ticket};

/// Describes how an entity maps onto its table. `Store<E>` builds all of its
/// SQL from these constants, so every registry shares one set of queries.
pub trait Record: Clone + fmt::Debug + fmt::Display {
    const KIND: EntityKind;
    const TABLE: &'static str;
    /// Binding order for `to_params` and `from_row`. The key comes first and
    /// `status` last.
    const COLUMNS: &'static [&'static str];
    /// Column used by `SortKey::Natural`.
    const NATURAL_COLUMN: &'static str;
    /// Columns matched by a text search.
    const SEARCH_COLUMNS: &'static [&'static str];

    fn key(&self) -> &str;
    fn status(&self) -> Status;
    fn set_status(&mut self, status: Status);

    /// Strip surrounding whitespace from the key and every text attribute.
    fn trim_fields(&mut self);

    /// `(field label, value)` pairs that must not be blank, key included.
    fn required_fields(&self) -> Vec<(&'static str, &str)>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn to_params(&self) -> Vec<&dyn ToSql>;

    fn key_column() -> &'static str {
        Self::COLUMNS[0]
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

macro_rules! coded_record {
    ($ty:ident, $kind:expr, $table:literal) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [&'static str] = &["code", "name", "status"];
            const NATURAL_COLUMN: &'static str = "name";
            const SEARCH_COLUMNS: &'static [&'static str] = &["code", "name"];

            fn key(&self) -> &str {
                &self.code
            }

            fn status(&self) -> Status {
                self.status
            }

            fn set_status(&mut self, status: Status) {
                self.status = status;
            }

            fn trim_fields(&mut self) {
                trim_in_place(&mut self.code);
                trim_in_place(&mut self.name);
            }

            fn required_fields(&self) -> Vec<(&'static str, &str)> {
                vec![("Code", self.code.as_str()), ("Name", self.name.as_str())]
            }

            fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                Ok(Self {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                })
            }

            fn to_params(&self) -> Vec<&dyn ToSql> {
                vec![
                    &self.code as &dyn ToSql,
                    &self.name as &dyn ToSql,
                    &self.status as &dyn ToSql,
                ]
            }
        }
    };
}

coded_record!(Faculty, EntityKind::Faculty, "faculties");
coded_record!(Program, EntityKind::Program, "programs");
coded_record!(Student, EntityKind::Student, "students");

impl Record for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;
    const TABLE: &'static str = "tickets";
    const COLUMNS: &'static [&'static str] = &[
        "ticket_number",
        "date",
        "student_code",
        "faculty_code",
        "program_code",
        "description",
        "status",
    ];
    const NATURAL_COLUMN: &'static str = "date";
    const SEARCH_COLUMNS: &'static [&'static str] = &["ticket_number", "date", "description"];

    fn key(&self) -> &str {
        &self.ticket_number
    }

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn trim_fields(&mut self) {
        trim_in_place(&mut self.ticket_number);
        trim_in_place(&mut self.date);
        trim_in_place(&mut self.student_code);
        trim_in_place(&mut self.faculty_code);
        trim_in_place(&mut self.program_code);
        trim_in_place(&mut self.description);
    }

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Ticket number", self.ticket_number.as_str()),
            ("Date", self.date.as_str()),
            ("Student code", self.student_code.as_str()),
            ("Faculty code", self.faculty_code.as_str()),
            ("Program code", self.program_code.as_str()),
            ("Description", self.description.as_str()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ticket_number: row.get(0)?,
            date: row.get(1)?,
            student_code: row.get(2)?,
            faculty_code: row.get(3)?,
            program_code: row.get(4)?,
            description: row.get(5)?,
            status: row.get(6)?,
        })
    }

    fn to_params(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.ticket_number as &dyn ToSql,
            &self.date as &dyn ToSql,
            &self.student_code as &dyn ToSql,
            &self.faculty_code as &dyn ToSql,
            &self.program_code as &dyn ToSql,
            &self.description as &dyn ToSql,
            &self.status as &dyn ToSql,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_fields_strips_key_and_text() {
        let mut faculty = Faculty::new(" 17 ", "  FIPS");
        faculty.trim_fields();
        assert_eq!(faculty, Faculty::new("17", "FIPS"));

        let mut ticket = Ticket {
            ticket_number: "T0001 ".into(),
            date: " 20240115".into(),
            student_code: "2020001".into(),
            faculty_code: " 17".into(),
            program_code: "70 ".into(),
            description: " test ".into(),
            status: Status::Active,
        };
        ticket.trim_fields();
        assert_eq!(ticket.ticket_number, "T0001");
        assert_eq!(ticket.faculty_code, "17");
        assert_eq!(ticket.description, "test");
    }
}
