use ratatui::style::{Color, Modifier, Style};

use crate::{notify::Level, upload::UploadState};

pub const SPACE_Y: u16 = 1;

#[inline]
pub fn heading_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

#[inline]
pub fn border_style() -> Style {
    Style::default().fg(Color::LightBlue)
}

/// The drop area border follows the drag flag first, then any error, then the upload state.
#[inline]
pub fn drop_area_style(state: &UploadState, drag_over: bool, has_error: bool) -> Style {
    let color = if drag_over {
        Color::LightCyan
    } else if has_error {
        Color::LightRed
    } else {
        upload_state_color(state)
    };
    Style::default().fg(color)
}

#[inline]
pub fn gauge_style() -> Style {
    Style::default()
        .fg(upload_state_color(&UploadState::Uploading { percent: 0 }))
        .add_modifier(Modifier::BOLD)
}

#[inline]
pub fn status_style(state: &UploadState) -> Style {
    Style::default()
        .fg(upload_state_color(state))
        .add_modifier(Modifier::BOLD)
}

#[inline]
pub fn hint_style() -> Style {
    Style::default().fg(Color::Gray)
}

#[inline]
pub fn error_style() -> Style {
    Style::default()
        .fg(Color::LightRed)
        .add_modifier(Modifier::BOLD)
}

#[inline]
pub fn key_style() -> Style {
    Style::default()
        .fg(Color::LightYellow)
        .add_modifier(Modifier::BOLD)
}

#[inline]
pub fn check_style(done: bool) -> Style {
    if done {
        Style::default().fg(Color::LightGreen)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

#[inline]
pub fn publish_style(enabled: bool) -> Style {
    if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightBlue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

#[inline]
pub fn notification_style(level: Level) -> Style {
    let color = match level {
        Level::Success => Color::LightGreen,
        Level::Error => Color::LightRed,
        Level::Info => Color::LightBlue,
        Level::Warning => Color::LightYellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn upload_state_color(state: &UploadState) -> Color {
    match state {
        UploadState::Idle => Color::LightBlue,
        UploadState::Uploading { .. } => Color::LightYellow,
        UploadState::Complete(_) => Color::LightGreen,
        UploadState::Error(_) => Color::LightRed,
    }
}
