use std::mem;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::composer::TicketRegistry;
use crate::db::Record;
use crate::desk::Desk;
use crate::error::DeskError;
use crate::lifecycle::Lifecycle;
use crate::models::{EntityKind, Faculty, Named, Program, SortKey, Status, Student, Ticket};
use crate::projection::{Projection, RowSource};

use super::forms::{
    CodedField, CodedForm, ConfirmRemove, PickOption, ReferencePicker, TicketField, TicketForm,
};
use super::helpers::{
    centered_rect, key_hint, registry_title, sort_label, status_style, surface_error,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the search/sort header above each list.
const HEADER_HEIGHT: u16 = 3;
const PAGE: isize = 10;
const MENU: [EntityKind; 4] = [
    EntityKind::Faculty,
    EntityKind::Program,
    EntityKind::Student,
    EntityKind::Ticket,
];

enum Screen {
    Menu,
    Faculties(ListScreen<Faculty>),
    Programs(ListScreen<Program>),
    Students(ListScreen<Student>),
    Tickets(ListScreen<Ticket>),
}

impl Screen {
    fn open(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Faculty => Screen::Faculties(ListScreen::new()),
            EntityKind::Program => Screen::Programs(ListScreen::new()),
            EntityKind::Student => Screen::Students(ListScreen::new()),
            EntityKind::Ticket => Screen::Tickets(ListScreen::new()),
        }
    }

    fn list(&self) -> Option<&dyn ListControls> {
        match self {
            Screen::Menu => None,
            Screen::Faculties(list) => Some(list),
            Screen::Programs(list) => Some(list),
            Screen::Students(list) => Some(list),
            Screen::Tickets(list) => Some(list),
        }
    }

    fn list_mut(&mut self) -> Option<&mut dyn ListControls> {
        match self {
            Screen::Menu => None,
            Screen::Faculties(list) => Some(list),
            Screen::Programs(list) => Some(list),
            Screen::Students(list) => Some(list),
            Screen::Tickets(list) => Some(list),
        }
    }
}

/// One registry's list: the projection plus the highlighted row.
struct ListScreen<E> {
    projection: Projection<E>,
    selected: usize,
}

impl<E: Record> ListScreen<E> {
    fn new() -> Self {
        Self {
            projection: Projection::new(),
            selected: 0,
        }
    }

    fn refresh(&mut self, source: &impl RowSource<E>) -> Result<()> {
        self.projection.refresh(source)?;
        let len = self.projection.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        Ok(())
    }

    fn current(&self) -> Option<&E> {
        self.projection.rows().get(self.selected)
    }
}

/// The selected row, reduced to what status commands need.
struct Entry {
    kind: EntityKind,
    key: String,
    label: String,
    status: Status,
}

/// Operations on a list that do not depend on the entity type.
trait ListControls {
    fn kind(&self) -> EntityKind;
    fn move_by(&mut self, offset: isize);
    fn focus(&mut self, key: &str);
    fn search(&self) -> &str;
    fn set_search(&mut self, text: String);
    fn sort(&self) -> SortKey;
    fn set_sort(&mut self, sort: SortKey);
    fn entry(&self) -> Option<Entry>;
}

impl<E: Record> ListControls for ListScreen<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    fn move_by(&mut self, offset: isize) {
        let len = self.projection.rows().len();
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn focus(&mut self, key: &str) {
        if let Some(idx) = self.projection.rows().iter().position(|r| r.key() == key) {
            self.selected = idx;
        }
    }

    fn search(&self) -> &str {
        &self.projection.query().search
    }

    fn set_search(&mut self, text: String) {
        self.projection.set_search(text);
        self.selected = 0;
    }

    fn sort(&self) -> SortKey {
        self.projection.query().sort
    }

    fn set_sort(&mut self, sort: SortKey) {
        self.projection.set_sort(sort);
    }

    fn entry(&self) -> Option<Entry> {
        self.current().map(|record| Entry {
            kind: E::KIND,
            key: record.key().to_string(),
            label: record.to_string(),
            status: record.status(),
        })
    }
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    Searching,
    CodedForm(CodedForm),
    TicketForm(TicketForm),
    Picker(ReferencePicker),
    ConfirmRemove(ConfirmRemove),
}

#[derive(Clone, Copy)]
enum Transition {
    Remove,
    Deactivate,
    Reactivate,
}

impl Transition {
    fn past_tense(&self) -> &'static str {
        match self {
            Transition::Remove => "Removed",
            Transition::Deactivate => "Deactivated",
            Transition::Reactivate => "Reactivated",
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    desk: Desk,
    screen: Screen,
    mode: Mode,
    menu_selected: usize,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(desk: Desk) -> Result<Self> {
        Ok(Self {
            desk,
            screen: Screen::Menu,
            mode: Mode::Normal,
            menu_selected: 0,
            status: None,
        })
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching => self.handle_search(code),
            Mode::CodedForm(form) => self.handle_coded_form(code, form)?,
            Mode::TicketForm(form) => self.handle_ticket_form(code, form)?,
            Mode::Picker(picker) => self.handle_picker(code, picker),
            Mode::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm),
        };

        self.refresh()?;
        Ok(exit)
    }

    /// Bring the visible list up to date with its inputs and the database.
    fn refresh(&mut self) -> Result<()> {
        let desk = &self.desk;
        match &mut self.screen {
            Screen::Menu => Ok(()),
            Screen::Faculties(list) => list.refresh(desk.faculties()),
            Screen::Programs(list) => list.refresh(desk.programs()),
            Screen::Students(list) => list.refresh(desk.students()),
            Screen::Tickets(list) => list.refresh(desk.tickets()),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if matches!(self.screen, Screen::Menu) {
            self.handle_menu_key(code, exit);
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.clear_status();
                self.screen = Screen::Menu;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE),
            KeyCode::PageDown => self.move_selection(PAGE),
            KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Searching);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(list) = self.screen.list_mut() {
                    let sort = list.sort().toggle();
                    list.set_sort(sort);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') => return Ok(self.open_new_form()),
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                return Ok(self.open_edit_form())
            }
            KeyCode::Char('i') | KeyCode::Char('I') => self.toggle_active(),
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                let selected = self.screen.list().and_then(|list| list.entry());
                match selected {
                    Some(entry) => {
                        self.clear_status();
                        return Ok(Mode::ConfirmRemove(ConfirmRemove {
                            kind: entry.kind,
                            key: entry.key,
                            label: entry.label,
                        }));
                    }
                    None => self.set_status("Nothing selected to remove.", StatusKind::Error),
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_menu_key(&mut self, code: KeyCode, exit: &mut bool) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.menu_selected = self.menu_selected.saturating_sub(1),
            KeyCode::Down => self.menu_selected = (self.menu_selected + 1).min(MENU.len() - 1),
            KeyCode::Char(ch @ '1'..='4') => {
                self.menu_selected = ch as usize - '1' as usize;
                self.open_registry(MENU[self.menu_selected]);
            }
            KeyCode::Enter => self.open_registry(MENU[self.menu_selected]),
            _ => {}
        }
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        let Some(list) = self.screen.list_mut() else {
            return Mode::Normal;
        };

        match code {
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Esc => {
                list.set_search(String::new());
                return Mode::Normal;
            }
            KeyCode::Up => list.move_by(-1),
            KeyCode::Down => list.move_by(1),
            KeyCode::Backspace => {
                let mut text = list.search().to_string();
                text.pop();
                list.set_search(text);
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut text = list.search().to_string();
                text.push(ch);
                list.set_search(text);
            }
            _ => {}
        }
        Mode::Searching
    }

    fn handle_coded_form(&mut self, code: KeyCode, mut form: CodedForm) -> Result<Mode> {
        if form.read_only {
            return Ok(self.handle_read_only(code, form.kind, &form.code.clone(), |err| {
                form.error = Some(err);
                Mode::CodedForm(form)
            }));
        }

        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_coded(&form) {
                Ok(key) => {
                    self.refresh()?;
                    self.focus(&key);
                    let verb = if form.editing { "Updated" } else { "Added" };
                    self.set_status(format!("{verb} {} {key}.", form.kind), StatusKind::Info);
                    return Ok(Mode::Normal);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::CodedForm(form))
    }

    fn handle_ticket_form(&mut self, code: KeyCode, mut form: TicketForm) -> Result<Mode> {
        if form.read_only {
            let number = form.display_number.clone();
            return Ok(self.handle_read_only(code, EntityKind::Ticket, &number, |err| {
                form.error = Some(err);
                Mode::TicketForm(form)
            }));
        }

        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::F(2) => return Ok(self.open_picker(form)),
            KeyCode::Backspace => {
                form.backspace();
                self.resolve_names(&mut form);
            }
            KeyCode::Enter => match self.desk.composer().compose_and_save(form.to_draft()) {
                Ok(ticket) => {
                    self.refresh()?;
                    self.focus(&ticket.ticket_number);
                    let verb = if form.ticket_number.is_some() {
                        "Updated"
                    } else {
                        "Opened"
                    };
                    self.set_status(
                        format!("{verb} ticket {}.", ticket.ticket_number),
                        StatusKind::Info,
                    );
                    return Ok(Mode::Normal);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    self.resolve_names(&mut form);
                }
            }
            _ => {}
        }
        Ok(Mode::TicketForm(form))
    }

    /// Offer the active records of the registry behind the focused field.
    /// Date and description have no picker.
    fn open_picker(&mut self, mut form: TicketForm) -> Mode {
        let field = form.active;
        let options = match field.reference_kind() {
            Some(EntityKind::Student) => active_options(self.desk.students()),
            Some(EntityKind::Faculty) => active_options(self.desk.faculties()),
            Some(EntityKind::Program) => active_options(self.desk.programs()),
            Some(EntityKind::Ticket) | None => return Mode::TicketForm(form),
        };

        match options {
            Ok(options) => {
                self.clear_status();
                Mode::Picker(ReferencePicker::new(form, field, options))
            }
            Err(err) => {
                let message = surface_error(&err);
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Mode::TicketForm(form)
            }
        }
    }

    fn handle_picker(&mut self, code: KeyCode, mut picker: ReferencePicker) -> Mode {
        match code {
            KeyCode::Esc => return Mode::TicketForm(picker.cancel()),
            KeyCode::Enter => {
                return match picker.choose() {
                    Ok(form) => Mode::TicketForm(form),
                    Err(picker) => {
                        self.set_status("No matching record.", StatusKind::Error);
                        Mode::Picker(picker)
                    }
                }
            }
            KeyCode::Up => picker.move_by(-1),
            KeyCode::Down => picker.move_by(1),
            KeyCode::PageUp => picker.move_by(-PAGE),
            KeyCode::PageDown => picker.move_by(PAGE),
            KeyCode::Backspace => picker.backspace(),
            KeyCode::Char(ch) => picker.push_char(ch),
            _ => {}
        }
        Mode::Picker(picker)
    }

    /// Inactive records open read-only: the only action offered is
    /// reactivation. `keep_open` rebuilds the mode with an error message.
    fn handle_read_only(
        &mut self,
        code: KeyCode,
        kind: EntityKind,
        key: &str,
        keep_open: impl FnOnce(String) -> Mode,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                match self.apply_transition(kind, key, Transition::Reactivate) {
                    Ok(()) => Mode::Normal,
                    Err(err) => keep_open(surface_error(&err)),
                }
            }
            _ => keep_open(String::from("Inactive records are read-only; press r to reactivate.")),
        }
    }

    fn handle_confirm_remove(&mut self, code: KeyCode, confirm: ConfirmRemove) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                // Failures are reported by apply_transition.
                let _ = self.apply_transition(confirm.kind, &confirm.key, Transition::Remove);
                Mode::Normal
            }
            _ => Mode::ConfirmRemove(confirm),
        }
    }

    fn open_registry(&mut self, kind: EntityKind) {
        self.clear_status();
        self.screen = Screen::open(kind);
    }

    fn open_new_form(&mut self) -> Mode {
        let Some(kind) = self.screen.list().map(|list| list.kind()) else {
            return Mode::Normal;
        };
        self.clear_status();

        if kind != EntityKind::Ticket {
            return Mode::CodedForm(CodedForm::new(kind));
        }

        match self.desk.composer().next_ticket_number() {
            Ok(number) => {
                let today = Local::now().format("%Y%m%d").to_string();
                Mode::TicketForm(TicketForm::new(number, today))
            }
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn open_edit_form(&mut self) -> Mode {
        let mode = match &self.screen {
            Screen::Menu => None,
            Screen::Faculties(list) => list.current().map(CodedForm::from_record).map(Mode::CodedForm),
            Screen::Programs(list) => list.current().map(CodedForm::from_record).map(Mode::CodedForm),
            Screen::Students(list) => list.current().map(CodedForm::from_record).map(Mode::CodedForm),
            Screen::Tickets(list) => list.current().map(TicketForm::from_ticket).map(|mut form| {
                self.resolve_names(&mut form);
                Mode::TicketForm(form)
            }),
        };

        match mode {
            Some(mode) => {
                self.clear_status();
                mode
            }
            None => {
                self.set_status("Nothing selected to edit.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    /// `i` flips the selected record between active and inactive.
    fn toggle_active(&mut self) {
        let Some(entry) = self.screen.list().and_then(|list| list.entry()) else {
            self.set_status("Nothing selected.", StatusKind::Error);
            return;
        };
        let transition = match entry.status {
            Status::Active => Transition::Deactivate,
            _ => Transition::Reactivate,
        };
        // Failures are reported by apply_transition.
        let _ = self.apply_transition(entry.kind, &entry.key, transition);
    }

    fn apply_transition(
        &mut self,
        kind: EntityKind,
        key: &str,
        transition: Transition,
    ) -> Result<(), DeskError> {
        let result = match kind {
            EntityKind::Faculty => run_transition(self.desk.faculties(), key, transition),
            EntityKind::Program => run_transition(self.desk.programs(), key, transition),
            EntityKind::Student => run_transition(self.desk.students(), key, transition),
            EntityKind::Ticket => run_ticket_transition(self.desk.tickets(), key, transition),
        };

        match &result {
            Ok(()) => self.set_status(
                format!("{} {kind} {key}.", transition.past_tense()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(err), StatusKind::Error),
        }
        result
    }

    fn save_coded(&self, form: &CodedForm) -> Result<String, DeskError> {
        match form.kind {
            EntityKind::Faculty => save_named(self.desk.faculties(), form),
            EntityKind::Program => save_named(self.desk.programs(), form),
            EntityKind::Student => save_named(self.desk.students(), form),
            EntityKind::Ticket => Err(DeskError::Validation {
                field: "Ticket",
                reason: "must be saved through the ticket form".to_string(),
            }),
        }
    }

    /// Look up the display names behind the form's reference codes.
    fn resolve_names(&self, form: &mut TicketForm) {
        form.names = [
            display_name(self.desk.students(), &form.student_code),
            display_name(self.desk.faculties(), &form.faculty_code),
            display_name(self.desk.programs(), &form.program_code),
        ];
    }

    fn move_selection(&mut self, offset: isize) {
        if let Some(list) = self.screen.list_mut() {
            list.move_by(offset);
        }
    }

    fn focus(&mut self, key: &str) {
        if let Some(list) = self.screen.list_mut() {
            list.focus(key);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Menu => self.draw_menu(frame, content_area),
            Screen::Faculties(list) => self.draw_list(frame, content_area, list),
            Screen::Programs(list) => self.draw_list(frame, content_area, list),
            Screen::Students(list) => self.draw_list(frame, content_area, list),
            Screen::Tickets(list) => self.draw_list(frame, content_area, list),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::CodedForm(form) => self.draw_coded_form(frame, area, form),
            Mode::TicketForm(form) => self.draw_ticket_form(frame, area, form),
            Mode::Picker(picker) => {
                self.draw_ticket_form(frame, area, &picker.form);
                self.draw_picker(frame, area, picker);
            }
            Mode::ConfirmRemove(confirm) => self.draw_confirm_remove(frame, area, confirm),
            Mode::Searching => self.place_search_cursor(frame, content_area),
            Mode::Normal => {}
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = MENU
            .iter()
            .enumerate()
            .map(|(idx, kind)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}  ", idx + 1),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(registry_title(*kind)),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.menu_selected));

        let list = List::new(items)
            .block(Block::default().title("Ticket Desk").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_list<E: Record>(&self, frame: &mut Frame, area: Rect, screen: &ListScreen<E>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(area);

        let query = screen.projection.query();
        let searching = !query.search.trim().is_empty();
        let sort_text = if searching {
            String::from("by code (search)")
        } else {
            format!("by {}", sort_label(E::KIND, query.sort))
        };
        let header = Paragraph::new(Line::from(vec![
            Span::raw("Search: "),
            Span::styled(query.search.clone(), Style::default().fg(Color::Yellow)),
            Span::raw("   Sort: "),
            Span::raw(sort_text),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let rows = screen.projection.rows();
        let items: Vec<ListItem> = rows
            .iter()
            .map(|record| {
                let status = record.status();
                let line = Line::from(vec![
                    Span::styled(
                        format!("{:<10} ", record.key()),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(record.to_string()),
                    Span::styled(format!("  [{status}]"), status_style(status)),
                ]);
                let item = ListItem::new(line);
                if status == Status::Inactive {
                    item.style(Style::default().fg(Color::DarkGray))
                } else {
                    item
                }
            })
            .collect();

        let mut state = ListState::default();
        state.select((!rows.is_empty()).then_some(screen.selected));

        let title = format!("{} ({})", registry_title(E::KIND), rows.len());
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn place_search_cursor(&self, frame: &mut Frame, area: Rect) {
        if let Some(list) = self.screen.list() {
            let x = area.x + 1 + "Search: ".len() as u16 + list.search().chars().count() as u16;
            frame.set_cursor_position((x, area.y + 1));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&'static str, &'static str)] = match (&self.screen, &self.mode) {
            (_, Mode::Searching) => &[("Type", "Filter"), ("Enter", "Keep"), ("Esc", "Clear")],
            (_, Mode::CodedForm(form)) if form.read_only => &[("r", "Reactivate"), ("Esc", "Close")],
            (_, Mode::TicketForm(form)) if form.read_only => &[("r", "Reactivate"), ("Esc", "Close")],
            (_, Mode::TicketForm(_)) => &[
                ("Tab", "Next field"),
                ("F2", "Pick"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ],
            (_, Mode::Picker(_)) => &[("Type", "Filter"), ("Enter", "Choose"), ("Esc", "Back")],
            (_, Mode::CodedForm(_)) => {
                &[("Tab", "Next field"), ("Enter", "Save"), ("Esc", "Cancel")]
            }
            (_, Mode::ConfirmRemove(_)) => &[("y", "Remove"), ("n", "Keep")],
            (Screen::Menu, _) => &[("↑↓", "Navigate"), ("Enter", "Open"), ("q", "Quit")],
            _ => &[
                ("↑↓", "Navigate"),
                ("/", "Search"),
                ("s", "Sort"),
                ("n", "New"),
                ("Enter", "Edit"),
                ("i", "Toggle active"),
                ("d", "Remove"),
                ("Esc", "Menu"),
            ],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|&(key, action)| key_hint(key, action))
                .collect::<Vec<_>>(),
        )
    }

    fn draw_coded_form(&self, frame: &mut Frame, area: Rect, form: &CodedForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let title = match (form.editing, form.read_only) {
            (_, true) => format!("Inactive {}", form.kind),
            (true, false) => format!("Edit {}", form.kind),
            (false, false) => format!("New {}", form.kind),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(CodedField::Code),
            form.build_line(CodedField::Name),
            Line::from(""),
        ];
        lines.push(form_message(form.error.as_deref(), form.read_only));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if !form.read_only {
            let (prefix, row) = match form.active {
                CodedField::Code => ("Code: ".len(), 0),
                CodedField::Name => ("Name: ".len(), 1),
            };
            frame.set_cursor_position((
                inner.x + (prefix + form.value_len(form.active)) as u16,
                inner.y + row,
            ));
        }
    }

    fn draw_ticket_form(&self, frame: &mut Frame, area: Rect, form: &TicketForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = match (form.ticket_number.is_some(), form.read_only) {
            (_, true) => "Inactive Ticket",
            (true, false) => "Edit Ticket",
            (false, false) => "New Ticket",
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(vec![
            Span::raw("Ticket: "),
            Span::styled(
                form.display_number.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])];
        lines.extend(TicketField::ALL.iter().map(|field| form.build_line(*field)));
        lines.push(Line::from(""));
        lines.push(form_message(form.error.as_deref(), form.read_only));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if !form.read_only {
            let prefix = form.active.label().len() + 2;
            frame.set_cursor_position((
                inner.x + (prefix + form.value_len(form.active)) as u16,
                inner.y + 1 + form.row_of(form.active),
            ));
        }
    }

    fn draw_picker(&self, frame: &mut Frame, area: Rect, picker: &ReferencePicker) {
        let popup_area = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(picker.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        let filter = Paragraph::new(Line::from(vec![
            Span::raw("Filter: "),
            Span::styled(picker.filter.clone(), Style::default().fg(Color::Yellow)),
        ]));
        frame.render_widget(filter, chunks[0]);

        let visible = picker.visible();
        let items: Vec<ListItem> = visible
            .iter()
            .map(|option| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<10} ", option.code),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(option.name.clone()),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select((!visible.is_empty()).then_some(picker.selected));
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut state);

        frame.set_cursor_position((
            chunks[0].x + ("Filter: ".len() + picker.filter.chars().count()) as u16,
            chunks[0].y,
        ));
    }

    fn draw_confirm_remove(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmRemove) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove {} {} ({})?",
                confirm.kind, confirm.key, confirm.label
            )),
            Line::from(Span::styled(
                "Removed records disappear from every list.",
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "y to remove • n to keep",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Confirm").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

fn form_message(error: Option<&str>, read_only: bool) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None if read_only => Line::from(Span::styled(
            "Inactive: r to reactivate • Esc to close",
            Style::default().fg(Color::Gray),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

fn run_transition<E: Record>(
    engine: &Lifecycle<E>,
    key: &str,
    transition: Transition,
) -> Result<(), DeskError> {
    match transition {
        Transition::Remove => engine.remove(key),
        Transition::Deactivate => engine.deactivate(key),
        Transition::Reactivate => engine.reactivate(key),
    }
}

fn run_ticket_transition(
    tickets: &TicketRegistry,
    number: &str,
    transition: Transition,
) -> Result<(), DeskError> {
    match transition {
        Transition::Remove => tickets.remove(number),
        Transition::Deactivate => tickets.deactivate(number),
        Transition::Reactivate => tickets.reactivate(number),
    }
}

/// Active records of one registry, ordered by name, as picker options.
fn active_options<E: Record + Named>(engine: &Lifecycle<E>) -> Result<Vec<PickOption>, DeskError> {
    Ok(engine
        .list("", SortKey::Natural)?
        .into_iter()
        .filter(|record| record.status() == Status::Active)
        .map(|record| PickOption {
            code: record.code().to_string(),
            name: record.name().to_string(),
        })
        .collect())
}

fn save_named<E: Record + Named>(engine: &Lifecycle<E>, form: &CodedForm) -> Result<String, DeskError> {
    let record: E = form.to_record();
    let saved = if form.editing {
        engine.modify(record)?
    } else {
        engine.create(record)?
    };
    Ok(saved.key().to_string())
}

fn display_name<E: Record + Named>(engine: &Lifecycle<E>, code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    match engine.get(code) {
        Ok(record) => record
            .filter(|r| !r.status().is_removed())
            .map(|r| r.name().to_string()),
        Err(err) => {
            warn!(kind = %E::KIND, code, error = %err, "reference lookup failed");
            None
        }
    }
}
