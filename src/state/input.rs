use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::publish::form::{DESCRIPTION_MAX, TITLE_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Path,
    Title,
    Description,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::Path => "File path",
            Self::Title => "Title",
            Self::Description => "Description",
        }
    }

    fn max_chars(self) -> Option<usize> {
        match self {
            Self::Path => None,
            Self::Title => Some(TITLE_MAX),
            Self::Description => Some(DESCRIPTION_MAX),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Submitted(Field, String),
    Cancelled,
}

/// Single-line text entry shown at the bottom of the screen.
#[derive(Debug, Default)]
pub struct Prompt {
    field: Option<Field>,
    buffer: String,
}

impl Prompt {
    pub fn open(&mut self, field: Field, initial: &str) {
        self.field = Some(field);
        self.buffer.clear();
        self.insert_str(initial);
    }

    pub fn is_open(&self) -> bool {
        self.field.is_some()
    }

    pub fn field(&self) -> Option<Field> {
        self.field
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Append text, dropping line breaks and anything past the field's limit.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.push(c);
        }
    }

    fn push(&mut self, c: char) {
        let Some(field) = self.field else {
            return;
        };
        if let Some(max) = field.max_chars() {
            if self.buffer.chars().count() >= max {
                return;
            }
        }
        self.buffer.push(c);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        let Some(field) = self.field else {
            return PromptOutcome::Cancelled;
        };

        match key.code {
            KeyCode::Enter => {
                self.field = None;
                PromptOutcome::Submitted(field, std::mem::take(&mut self.buffer))
            }
            KeyCode::Esc => {
                self.field = None;
                self.buffer.clear();
                PromptOutcome::Cancelled
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                PromptOutcome::Editing
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.push(c);
                PromptOutcome::Editing
            }
            _ => PromptOutcome::Editing,
        }
    }
}
