//! Domain models shared by the persistence layer, the lifecycle engine and the
//! terminal front-end. These stay plain data holders; the rules about which
//! transitions are legal live in `lifecycle` and `composer`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Three-state record lifecycle. `Removed` is terminal and hides the record
/// from every listing, but the row itself is never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Removed,
}

impl Status {
    /// Marker persisted in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "A",
            Status::Inactive => "I",
            Status::Removed => "*",
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Status::Removed)
    }

    /// Human-readable label used by the UI and in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Removed => "Removed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a stored status marker is not one of `A`, `I` or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown record status marker `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Status::Active),
            "I" => Ok(Status::Inactive),
            "*" => Ok(Status::Removed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Column a listing is ordered by. `Natural` means the name for coded
/// entities and the date for tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Code,
    Natural,
}

impl SortKey {
    pub fn toggle(self) -> Self {
        match self {
            SortKey::Code => SortKey::Natural,
            SortKey::Natural => SortKey::Code,
        }
    }
}

/// The four registries managed by the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Faculty,
    Program,
    Student,
    Ticket,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Faculty => "Faculty",
            EntityKind::Program => "Program",
            EntityKind::Student => "Student",
            EntityKind::Ticket => "Ticket",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entities identified by a human-assigned code and carrying a display name.
/// Faculty, Program and Student share this shape, which lets forms and tests
/// treat them uniformly.
pub trait Named: Sized {
    fn named(code: String, name: String) -> Self;
    fn code(&self) -> &str;
    fn name(&self) -> &str;
}

macro_rules! coded_entity {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $ty {
            pub code: String,
            pub name: String,
            pub status: Status,
        }

        impl $ty {
            /// Build an active record; `Lifecycle::create` forces `Active` anyway.
            pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
                Self {
                    code: code.into(),
                    name: name.into(),
                    status: Status::Active,
                }
            }
        }

        impl Named for $ty {
            fn named(code: String, name: String) -> Self {
                Self::new(code, name)
            }

            fn code(&self) -> &str {
                &self.code
            }

            fn name(&self) -> &str {
                &self.name
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }
    };
}

coded_entity!(
    /// A faculty such as `17 FIPS`.
    Faculty
);
coded_entity!(
    /// A professional program offered by the university.
    Program
);
coded_entity!(
    /// A student, keyed by enrollment code.
    Student
);

/// A delivery ticket. `ticket_number` is system-generated (`T0001`, `T0002`,
/// ...) and never changes after the first save. The three codes are soft
/// references: they are checked when the ticket is written and left alone
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub ticket_number: String,
    /// `YYYYMMDD`.
    pub date: String,
    pub student_code: String,
    pub faculty_code: String,
    pub program_code: String,
    pub description: String,
    pub status: Status,
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.description)
    }
}

/// Caller-supplied ticket contents. `ticket_number` is `None` for a new
/// ticket and carries the existing number when editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDraft {
    pub ticket_number: Option<String>,
    pub date: String,
    pub student_code: String,
    pub faculty_code: String,
    pub program_code: String,
    pub description: String,
}

impl TicketDraft {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_number: Some(ticket.ticket_number.clone()),
            date: ticket.date.clone(),
            student_code: ticket.student_code.clone(),
            faculty_code: ticket.faculty_code.clone(),
            program_code: ticket.program_code.clone(),
            description: ticket.description.clone(),
        }
    }

    pub(crate) fn into_ticket(self, ticket_number: String, status: Status) -> Ticket {
        Ticket {
            ticket_number,
            date: self.date,
            student_code: self.student_code,
            faculty_code: self.faculty_code,
            program_code: self.program_code,
            description: self.description,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_markers_parse_back() {
        for status in [Status::Active, Status::Inactive, Status::Removed] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert_eq!(
            "X".parse::<Status>().unwrap_err(),
            UnknownStatus("X".to_string())
        );
    }

    #[test]
    fn sort_key_toggles() {
        assert_eq!(SortKey::Code.toggle(), SortKey::Natural);
        assert_eq!(SortKey::Natural.toggle(), SortKey::Code);
    }

    #[test]
    fn draft_round_trips_existing_ticket_number() {
        let ticket = Ticket {
            ticket_number: "T0003".into(),
            date: "20240117".into(),
            student_code: "2020003".into(),
            faculty_code: "17".into(),
            program_code: "72".into(),
            description: "Cambio de horario de clases".into(),
            status: Status::Inactive,
        };
        let draft = TicketDraft::from_ticket(&ticket);
        assert_eq!(draft.ticket_number.as_deref(), Some("T0003"));
        let rebuilt = draft.into_ticket("T0003".into(), Status::Inactive);
        assert_eq!(rebuilt, ticket);
    }
}
