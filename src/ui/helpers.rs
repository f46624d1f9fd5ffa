use std::fmt::Display;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::models::{EntityKind, SortKey, Status};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Message shown inline for a failed command.
pub(crate) fn surface_error(err: &impl Display) -> String {
    err.to_string()
}

/// Colour used for a record's status badge.
pub(crate) fn status_style(status: Status) -> Style {
    match status {
        Status::Active => Style::default().fg(Color::Green),
        Status::Inactive => Style::default().fg(Color::DarkGray),
        Status::Removed => Style::default().fg(Color::Red),
    }
}

pub(crate) fn registry_title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Faculty => "Faculties",
        EntityKind::Program => "Programs",
        EntityKind::Student => "Students",
        EntityKind::Ticket => "Tickets",
    }
}

/// Name of the column a sort key orders by for `kind`.
pub(crate) fn sort_label(kind: EntityKind, sort: SortKey) -> &'static str {
    match (sort, kind) {
        (SortKey::Code, EntityKind::Ticket) => "number",
        (SortKey::Code, _) => "code",
        (SortKey::Natural, EntityKind::Ticket) => "date",
        (SortKey::Natural, _) => "name",
    }
}

/// `[key] action` pair for the footer.
pub(crate) fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    [
        Span::styled(format!("[{key}]"), key_style),
        Span::raw(format!(" {action}   ")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_labels_follow_the_entity() {
        assert_eq!(sort_label(EntityKind::Ticket, SortKey::Natural), "date");
        assert_eq!(sort_label(EntityKind::Student, SortKey::Natural), "name");
        assert_eq!(sort_label(EntityKind::Ticket, SortKey::Code), "number");
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 10);
    }
}
