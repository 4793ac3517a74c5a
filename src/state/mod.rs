use std::{path::PathBuf, sync::Arc};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::time::Instant;
use tracing::{debug, info};

use self::input::{Field, Prompt, PromptOutcome};
use crate::{
    notify::{Level, Notifications},
    publish::{ApiError, FormConsumer, Video, VideoDraft, VideoForm},
    transfer::{TransferEvent, UploadRequest, UploadResult},
    upload::{
        drop::parse_dropped_paths, MediaKind, SelectedFile, Selection, UploadConfig,
        UploadConsumer, UploadWidget,
    },
};

pub mod input;

/// Work the event loop has to carry out on behalf of the state.
#[derive(Debug)]
pub enum Command {
    None,
    Quit,
    /// Load the file at this path and offer it to the widget.
    Select(PathBuf),
    /// Load the first dropped path and drop it onto the widget.
    Drop(Vec<PathBuf>),
    Upload(UploadRequest),
    Publish(VideoDraft),
}

/// Everything the upload screen shows. Owned by the event loop.
pub struct State {
    widget: UploadWidget,
    form: Option<VideoForm>,
    notifications: Notifications,
    prompt: Prompt,
    uploaded: Option<UploadResult>,
    publishing: bool,
}

impl State {
    /// Videos get a publish form bound to the widget; images only record the result.
    pub fn new(config: UploadConfig, form: Option<VideoForm>) -> Self {
        let form = match config.kind() {
            MediaKind::Video => Some(form.unwrap_or_default()),
            MediaKind::Image => None,
        };

        Self {
            widget: UploadWidget::new(Arc::new(config)),
            form,
            notifications: Notifications::new(),
            prompt: Prompt::default(),
            uploaded: None,
            publishing: false,
        }
    }

    pub fn widget(&self) -> &UploadWidget {
        &self.widget
    }

    pub fn form(&self) -> Option<&VideoForm> {
        self.form.as_ref()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Result handed over by the last completed image upload.
    pub fn uploaded(&self) -> Option<&UploadResult> {
        self.uploaded.as_ref()
    }

    pub fn is_publishing(&self) -> bool {
        self.publishing
    }

    pub fn notify(&mut self, message: impl Into<String>, level: Level, now: Instant) {
        self.notifications.show(message, level, now);
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) -> Command {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::Paste(text) => self.handle_paste(&text),
            _ => Command::None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Command {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Command::Quit;
        }

        if self.prompt.is_open() {
            return match self.prompt.handle_key(key) {
                PromptOutcome::Submitted(field, value) => self.submit(field, value),
                PromptOutcome::Editing | PromptOutcome::Cancelled => Command::None,
            };
        }

        // The published upload stays in place until the backend answered.
        if self.publishing && Self::edits_upload(key.code) {
            debug!(key = ?key.code, "Ignoring key while publishing.");
            return Command::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            KeyCode::Char('o') if self.widget.can_choose_file() => {
                self.prompt.open(Field::Path, "");
                Command::None
            }
            KeyCode::Enter | KeyCode::Char('u') => self
                .widget
                .start_upload()
                .map_or(Command::None, Command::Upload),
            KeyCode::Char('x') | KeyCode::Delete => {
                self.clear_upload();
                Command::None
            }
            KeyCode::Char('t') => {
                if let Some(form) = &self.form {
                    let title = form.title().to_owned();
                    self.prompt.open(Field::Title, &title);
                }
                Command::None
            }
            KeyCode::Char('d') => {
                if let Some(form) = &self.form {
                    let description = form.description().to_owned();
                    self.prompt.open(Field::Description, &description);
                }
                Command::None
            }
            KeyCode::Char('p') => self.publish(now),
            _ => Command::None,
        }
    }

    fn edits_upload(code: KeyCode) -> bool {
        matches!(
            code,
            KeyCode::Char('o' | 'u' | 'x' | 't' | 'd') | KeyCode::Enter | KeyCode::Delete
        )
    }

    /// Terminals paste the paths of files dragged onto them.
    fn handle_paste(&mut self, text: &str) -> Command {
        if self.prompt.is_open() {
            self.prompt.insert_str(text);
            return Command::None;
        }
        if !self.widget.can_choose_file() || self.publishing {
            debug!("Ignoring drop while uploading or publishing.");
            return Command::None;
        }

        let paths = parse_dropped_paths(text);
        if paths.is_empty() {
            return Command::None;
        }
        self.widget.drag_enter();
        Command::Drop(paths)
    }

    fn submit(&mut self, field: Field, value: String) -> Command {
        match (field, &mut self.form) {
            (Field::Path, _) => {
                let path = value.trim();
                if path.is_empty() {
                    Command::None
                } else {
                    Command::Select(PathBuf::from(path))
                }
            }
            (Field::Title, Some(form)) => {
                form.set_title(value);
                Command::None
            }
            (Field::Description, Some(form)) => {
                form.set_description(value);
                Command::None
            }
            (_, None) => Command::None,
        }
    }

    fn publish(&mut self, now: Instant) -> Command {
        if self.publishing {
            return Command::None;
        }
        let Some(form) = &self.form else {
            return Command::None;
        };

        match form.draft() {
            Ok(draft) => {
                self.publishing = true;
                Command::Publish(draft)
            }
            Err(error) => {
                self.notifications.show(error.to_string(), Level::Error, now);
                Command::None
            }
        }
    }

    pub fn select(&mut self, file: SelectedFile) -> Selection {
        if self.publishing {
            return Selection::Ignored;
        }
        let selection = self.widget.select(file);
        self.forget_uploaded(&selection);
        selection
    }

    pub fn drop_files(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> Selection {
        if self.publishing {
            self.widget.drag_leave();
            return Selection::Ignored;
        }
        let selection = self.widget.drop_files(files);
        self.forget_uploaded(&selection);
        selection
    }

    /// A newly staged file replaces the shown result of an earlier upload.
    fn forget_uploaded(&mut self, selection: &Selection) {
        if *selection == Selection::Staged {
            self.uploaded = None;
        }
    }

    fn clear_upload(&mut self) {
        self.widget.clear();
        self.uploaded = None;
    }

    /// A dropped path that could not be read still ends the drag.
    pub fn drop_failed(&mut self, message: impl Into<String>, now: Instant) {
        self.widget.drag_leave();
        self.notifications.show(message, Level::Error, now);
    }

    pub fn on_transfer_event(&mut self, event: TransferEvent, now: Instant) {
        let Self {
            widget,
            form,
            notifications,
            uploaded,
            ..
        } = self;

        match form {
            Some(form) => widget.handle_event(
                event,
                now,
                &mut FormConsumer {
                    form,
                    notifications,
                    now,
                },
            ),
            None => widget.handle_event(
                event,
                now,
                &mut MediaConsumer {
                    uploaded,
                    notifications,
                    now,
                },
            ),
        }
    }

    /// Hand a completed upload to its consumer once the display delay is over.
    pub fn tick(&mut self, now: Instant) {
        let Self {
            widget,
            form,
            notifications,
            uploaded,
            ..
        } = self;

        match form {
            Some(form) => widget.poll_delivery(
                now,
                &mut FormConsumer {
                    form,
                    notifications,
                    now,
                },
            ),
            None => widget.poll_delivery(
                now,
                &mut MediaConsumer {
                    uploaded,
                    notifications,
                    now,
                },
            ),
        };
    }

    pub fn on_published(&mut self, result: Result<Video, ApiError>, now: Instant) {
        self.publishing = false;

        match result {
            Ok(video) => {
                info!(id = ?video.id, title = %video.title, "Video published.");
                self.notifications
                    .show("Video published successfully!", Level::Success, now);
                if let Some(form) = &mut self.form {
                    form.reset();
                }
                self.clear_upload();
            }
            Err(error) => {
                let message = error.to_string();
                let message = if message.is_empty() {
                    "Failed to publish video".to_owned()
                } else {
                    message
                };
                self.notifications.show(message, Level::Error, now);
            }
        }
    }
}

/// Parent for image uploads, which have no form to fill.
struct MediaConsumer<'a> {
    uploaded: &'a mut Option<UploadResult>,
    notifications: &'a mut Notifications,
    now: Instant,
}

impl UploadConsumer for MediaConsumer<'_> {
    fn on_upload_success(&mut self, result: &UploadResult) {
        *self.uploaded = Some(result.clone());
        self.notifications
            .show("Image uploaded successfully!", Level::Success, self.now);
    }
}
