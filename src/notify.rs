use std::{collections::VecDeque, time::Duration};

use tokio::time::Instant;
use tracing::{info, warn};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

const HISTORY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub posted_at: Instant,
}

/// Short-lived user notifications. Owned by the application state and lent to
/// whichever component posts a message.
#[derive(Debug, Default)]
pub struct Notifications {
    entries: VecDeque<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: impl Into<String>, level: Level, now: Instant) {
        let message = message.into();
        match level {
            Level::Error | Level::Warning => warn!(?level, "{message}"),
            Level::Success | Level::Info => info!(?level, "{message}"),
        }

        if self.entries.len() == HISTORY {
            self.entries.pop_front();
        }
        self.entries.push_back(Notification {
            level,
            message,
            posted_at: now,
        });
    }

    /// The newest notification, while it is still on screen.
    pub fn current(&self, now: Instant) -> Option<&Notification> {
        self.entries
            .back()
            .filter(|entry| now.saturating_duration_since(entry.posted_at) < NOTIFICATION_TTL)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }
}
