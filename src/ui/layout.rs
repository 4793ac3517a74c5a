use std::rc::Rc;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use super::style;

pub(crate) const HEADING: usize = 0;
pub(crate) const DROP_AREA: usize = 1;
pub(crate) const CONSTRAINTS: usize = 2;
pub(crate) const ERROR: usize = 3;
pub(crate) const TIPS: usize = 4;
pub(crate) const DETAIL: usize = 5;
pub(crate) const NOTIFICATION: usize = 7;
pub(crate) const FOOTER: usize = 8;

/// Heights of the sections that are not always shown. Zero hides a section.
pub(crate) struct Sections {
    pub heading: u16,
    pub error: u16,
    pub detail: u16,
}

pub(crate) fn layout_chunks(size: Rect, sections: &Sections) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(layout_constraints(sections))
        .split(size)
}

fn layout_constraints(sections: &Sections) -> [Constraint; 9] {
    [
        // Heading and description
        Constraint::Length(sections.heading),
        // Drop area, bordered
        Constraint::Length(6),
        // Size limit and formats
        Constraint::Length(1 + style::SPACE_Y),
        // Error banner
        Constraint::Length(sections.error),
        // Upload tips, titled
        Constraint::Length(4),
        // Publish form or upload result
        Constraint::Length(sections.detail),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ]
}

/// Inner rows of the drop area while a file is uploading.
pub(crate) fn uploading_layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area)
}

/// Form fields on the left, readiness checklist on the right.
pub(crate) fn form_layout() -> [Constraint; 2] {
    [Constraint::Percentage(70), Constraint::Percentage(30)]
}
