use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::db::Record;
use crate::models::{EntityKind, Named, Status, Ticket, TicketDraft};

/// Form state for faculties, programs and students, which all carry a code
/// and a name.
#[derive(Clone)]
pub(crate) struct CodedForm {
    pub(crate) kind: EntityKind,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) active: CodedField,
    /// Editing an existing record: the code is locked.
    pub(crate) editing: bool,
    /// Inactive records are shown read-only until reactivated.
    pub(crate) read_only: bool,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum CodedField {
    #[default]
    Code,
    Name,
}

impl CodedForm {
    pub(crate) fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            code: String::new(),
            name: String::new(),
            active: CodedField::Code,
            editing: false,
            read_only: false,
            error: None,
        }
    }

    pub(crate) fn from_record<E: Record + Named>(record: &E) -> Self {
        Self {
            kind: E::KIND,
            code: record.code().to_string(),
            name: record.name().to_string(),
            active: CodedField::Name,
            editing: true,
            read_only: record.status() == Status::Inactive,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        if self.editing {
            return;
        }
        self.active = match self.active {
            CodedField::Code => CodedField::Name,
            CodedField::Name => CodedField::Code,
        };
    }

    /// Append a character to the active field. Codes take no whitespace.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            CodedField::Code if !ch.is_whitespace() => {
                self.code.push(ch);
                true
            }
            CodedField::Code => false,
            CodedField::Name => {
                self.name.push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            CodedField::Code => {
                self.code.pop();
            }
            CodedField::Name => {
                self.name.pop();
            }
        }
    }

    pub(crate) fn to_record<E: Named>(&self) -> E {
        E::named(self.code.trim().to_string(), self.name.trim().to_string())
    }

    pub(crate) fn build_line(&self, field: CodedField) -> Line<'static> {
        let (label, value) = match field {
            CodedField::Code => ("Code", &self.code),
            CodedField::Name => ("Name", &self.name),
        };
        let locked = self.read_only || (self.editing && field == CodedField::Code);
        field_line(label, value, self.active == field && !locked, locked)
    }

    pub(crate) fn value_len(&self, field: CodedField) -> usize {
        match field {
            CodedField::Code => self.code.chars().count(),
            CodedField::Name => self.name.chars().count(),
        }
    }
}

/// Ticket form. The number is never typed: it is the generated preview for a
/// new ticket, or the existing number when editing.
#[derive(Clone)]
pub(crate) struct TicketForm {
    pub(crate) ticket_number: Option<String>,
    pub(crate) display_number: String,
    pub(crate) date: String,
    pub(crate) student_code: String,
    pub(crate) faculty_code: String,
    pub(crate) program_code: String,
    pub(crate) description: String,
    /// Resolved names for student, faculty and program, in that order.
    pub(crate) names: [Option<String>; 3],
    pub(crate) active: TicketField,
    pub(crate) read_only: bool,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum TicketField {
    #[default]
    Date,
    Student,
    Faculty,
    Program,
    Description,
}

impl TicketField {
    pub(crate) const ALL: [TicketField; 5] = [
        TicketField::Date,
        TicketField::Student,
        TicketField::Faculty,
        TicketField::Program,
        TicketField::Description,
    ];

    pub(crate) fn label(&self) -> &'static str {
        match self {
            TicketField::Date => "Date (YYYYMMDD)",
            TicketField::Student => "Student",
            TicketField::Faculty => "Faculty",
            TicketField::Program => "Program",
            TicketField::Description => "Description",
        }
    }

    fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|field| field == self)
            .unwrap_or_default()
    }

    /// Registry a reference field points into.
    pub(crate) fn reference_kind(&self) -> Option<EntityKind> {
        match self {
            TicketField::Student => Some(EntityKind::Student),
            TicketField::Faculty => Some(EntityKind::Faculty),
            TicketField::Program => Some(EntityKind::Program),
            TicketField::Date | TicketField::Description => None,
        }
    }

    /// Slot in `TicketForm::names` for the reference fields.
    fn name_slot(&self) -> Option<usize> {
        match self {
            TicketField::Student => Some(0),
            TicketField::Faculty => Some(1),
            TicketField::Program => Some(2),
            TicketField::Date | TicketField::Description => None,
        }
    }
}

impl TicketForm {
    pub(crate) fn new(next_number: String, today: String) -> Self {
        Self {
            ticket_number: None,
            display_number: next_number,
            date: today,
            student_code: String::new(),
            faculty_code: String::new(),
            program_code: String::new(),
            description: String::new(),
            names: [None, None, None],
            active: TicketField::Student,
            read_only: false,
            error: None,
        }
    }

    pub(crate) fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_number: Some(ticket.ticket_number.clone()),
            display_number: ticket.ticket_number.clone(),
            date: ticket.date.clone(),
            student_code: ticket.student_code.clone(),
            faculty_code: ticket.faculty_code.clone(),
            program_code: ticket.program_code.clone(),
            description: ticket.description.clone(),
            names: [None, None, None],
            active: TicketField::Date,
            read_only: ticket.status == Status::Inactive,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % TicketField::ALL.len();
        self.active = TicketField::ALL[next];
    }

    pub(crate) fn prev_field(&mut self) {
        let len = TicketField::ALL.len();
        let prev = (self.active.index() + len - 1) % len;
        self.active = TicketField::ALL[prev];
    }

    pub(crate) fn value(&self, field: TicketField) -> &str {
        match field {
            TicketField::Date => &self.date,
            TicketField::Student => &self.student_code,
            TicketField::Faculty => &self.faculty_code,
            TicketField::Program => &self.program_code,
            TicketField::Description => &self.description,
        }
    }

    fn value_mut(&mut self, field: TicketField) -> &mut String {
        match field {
            TicketField::Date => &mut self.date,
            TicketField::Student => &mut self.student_code,
            TicketField::Faculty => &mut self.faculty_code,
            TicketField::Program => &mut self.program_code,
            TicketField::Description => &mut self.description,
        }
    }

    /// Append a character to the active field: digits only for the date,
    /// no whitespace in codes.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active;
        let accepted = match field {
            TicketField::Date => ch.is_ascii_digit() && self.date.len() < 8,
            TicketField::Student | TicketField::Faculty | TicketField::Program => {
                !ch.is_whitespace()
            }
            TicketField::Description => true,
        };
        if accepted {
            self.value_mut(field).push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Fill a reference field with a picked record.
    pub(crate) fn set_reference(&mut self, field: TicketField, code: String, name: String) {
        if let Some(slot) = field.name_slot() {
            *self.value_mut(field) = code;
            self.names[slot] = Some(name);
            self.error = None;
        }
    }

    pub(crate) fn to_draft(&self) -> TicketDraft {
        TicketDraft {
            ticket_number: self.ticket_number.clone(),
            date: self.date.trim().to_string(),
            student_code: self.student_code.trim().to_string(),
            faculty_code: self.faculty_code.trim().to_string(),
            program_code: self.program_code.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    pub(crate) fn build_line(&self, field: TicketField) -> Line<'static> {
        let value = self.value(field);
        let mut line = field_line(
            field.label(),
            value,
            self.active == field && !self.read_only,
            self.read_only,
        );

        if let Some(slot) = field.name_slot() {
            if !value.trim().is_empty() {
                let hint = match &self.names[slot] {
                    Some(name) => Span::styled(format!("  {name}"), Style::default().fg(Color::Green)),
                    None => Span::styled("  (not found)", Style::default().fg(Color::Red)),
                };
                line.spans.push(hint);
            }
        }
        line
    }

    pub(crate) fn value_len(&self, field: TicketField) -> usize {
        self.value(field).chars().count()
    }

    pub(crate) fn row_of(&self, field: TicketField) -> u16 {
        field.index() as u16
    }
}

/// One selectable record in a reference picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PickOption {
    pub(crate) code: String,
    pub(crate) name: String,
}

/// Chooser over the active records of one registry, opened from a ticket
/// reference field. The form it was opened from is parked inside and handed
/// back on `choose` or `cancel`.
pub(crate) struct ReferencePicker {
    pub(crate) form: TicketForm,
    pub(crate) field: TicketField,
    options: Vec<PickOption>,
    pub(crate) filter: String,
    pub(crate) selected: usize,
}

impl ReferencePicker {
    pub(crate) fn new(form: TicketForm, field: TicketField, options: Vec<PickOption>) -> Self {
        let current = form.value(field).trim();
        let selected = options
            .iter()
            .position(|option| option.code == current)
            .unwrap_or(0);
        Self {
            form,
            field,
            options,
            filter: String::new(),
            selected,
        }
    }

    pub(crate) fn title(&self) -> String {
        format!("Select {}", self.field.label())
    }

    /// Options whose code or name contains the filter, ignoring case.
    pub(crate) fn visible(&self) -> Vec<&PickOption> {
        let needle = self.filter.to_lowercase();
        self.options
            .iter()
            .filter(|option| {
                needle.is_empty()
                    || option.code.to_lowercase().contains(&needle)
                    || option.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub(crate) fn move_by(&mut self, offset: isize) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.filter.push(ch);
            self.selected = 0;
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.filter.pop();
        self.selected = 0;
    }

    /// Hand the form back with the highlighted record filled in. The picker
    /// itself comes back when nothing matches the filter.
    pub(crate) fn choose(self) -> Result<TicketForm, Self> {
        let choice = self.visible().get(self.selected).map(|option| (*option).clone());
        match choice {
            Some(option) => {
                let mut form = self.form;
                form.set_reference(self.field, option.code, option.name);
                Ok(form)
            }
            None => Err(self),
        }
    }

    pub(crate) fn cancel(self) -> TicketForm {
        self.form
    }
}

/// Confirmation state for a logical delete.
#[derive(Clone)]
pub(crate) struct ConfirmRemove {
    pub(crate) kind: EntityKind,
    pub(crate) key: String,
    pub(crate) label: String,
}

fn field_line(label: &str, value: &str, is_active: bool, locked: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    let style = if locked {
        Style::default().fg(Color::DarkGray)
    } else if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}
