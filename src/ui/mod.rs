use std::{io, sync::Arc};

use color_eyre::eyre::{bail, Report, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{
    sync::mpsc::{self, UnboundedSender},
    time::{Instant, MissedTickBehavior},
};
use tracing::{error, info, info_span, Instrument};

use crate::{
    notify::Level,
    publish::{
        form::{DESCRIPTION_MAX, TITLE_MAX},
        ApiError, Video, VideoForm, VideosClient,
    },
    state::{Command, State},
    transfer::{self, TransferDelegate, TransferEvent},
    upload::{MediaKind, SelectedFile, UploadState, UploadWidget},
    util::format_file_size,
};

mod layout;
mod style;

/// Remote ends the event loop hands work to.
pub struct Services {
    pub delegate: Arc<dyn TransferDelegate>,
    pub videos: VideosClient,
}

type PublishOutcome = Result<Video, ApiError>;

pub struct Ui;

impl Ui {
    pub fn new() -> Self {
        Ui
    }

    pub async fn event_loop(
        &self,
        state: &mut State,
        services: &Services,
        tick: u64,
    ) -> Result<()> {
        let mut terminal = self.take_terminal()?;

        // Funnel any error raised while the terminal is captured into one place,
        // release the terminal, and only then propagate it. Otherwise the report
        // is printed into the alternate screen and garbled.
        let result_while_captured_terminal = async {
            // Stream input events (Keyboard, Paste, Resize)
            let mut event_stream = EventStream::new();

            // Prepare render tick interval
            let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(tick));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let (transfer_tx, mut transfer_rx) = mpsc::unbounded_channel::<TransferEvent>();
            let (publish_tx, mut publish_rx) = mpsc::unbounded_channel::<PublishOutcome>();

            self.render(state, &mut terminal)?;

            loop {
                tokio::select! {
                    biased;

                    // Handle streamed input events as they occur
                    maybe_event = event_stream.next() => match maybe_event {
                        Some(Ok(event)) => {
                            let command = state.handle_event(event, Instant::now());
                            if !self.run(command, state, services, &transfer_tx, &publish_tx).await {
                                break;
                            }
                        }
                        // Event reader poll error, e.g. initialization failure, or interrupt
                        Some(Err(e)) => bail!(e),
                        // End of event stream
                        None => break,
                    },

                    Some(event) = transfer_rx.recv() => state.on_transfer_event(event, Instant::now()),

                    Some(outcome) = publish_rx.recv() => state.on_published(outcome, Instant::now()),

                    // Deliver completed uploads and render every N milliseconds
                    _ = interval.tick() => {
                        state.tick(Instant::now());
                        self.render(state, &mut terminal)?;
                    }
                }
            }

            Ok::<(), Report>(())
        }
        .await;

        // First release the terminal, then propagate a possible `Err(Report)`.
        Self::release_terminal(terminal)?;

        // Print a clean backtrace on failure.
        result_while_captured_terminal?;

        Ok(())
    }

    pub(crate) fn make_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }

    fn take_terminal(&self) -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
        enable_raw_mode()?;
        // Terminals paste the path of a file dropped onto them.
        execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
        Self::make_terminal()
    }

    pub(crate) fn release_terminal(
        mut terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<(), io::Error> {
        terminal.show_cursor()?;
        execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
        disable_raw_mode()
    }

    /// Carry out a command on behalf of the state. Returns `false` to quit.
    async fn run(
        &self,
        command: Command,
        state: &mut State,
        services: &Services,
        transfers: &UnboundedSender<TransferEvent>,
        published: &UnboundedSender<PublishOutcome>,
    ) -> bool {
        match command {
            Command::None => {}
            Command::Quit => return false,
            Command::Select(path) => match SelectedFile::from_path(&path).await {
                Ok(file) => {
                    state.select(file);
                }
                Err(e) => state.notify(e.to_string(), Level::Error, Instant::now()),
            },
            Command::Drop(paths) => {
                if paths.len() > 1 {
                    info!(dropped = paths.len(), "Only the first dropped file is used.");
                }
                // `State::handle_event` never asks to drop nothing.
                let Some(path) = paths.into_iter().next() else {
                    return true;
                };
                match SelectedFile::from_path(&path).await {
                    Ok(file) => {
                        state.drop_files([file]);
                    }
                    Err(e) => state.drop_failed(e.to_string(), Instant::now()),
                }
            }
            Command::Upload(request) => {
                transfer::spawn(services.delegate.clone(), request, transfers.clone());
            }
            Command::Publish(draft) => {
                let videos = services.videos.clone();
                let published = published.clone();
                let span = info_span!("publish", title = %draft.title);
                tokio::spawn(
                    async move {
                        let outcome = videos.create_video(&draft).await;
                        if let Err(e) = &outcome {
                            error!("Publishing failed: {e}");
                        }
                        // The loop is gone when the user quit meanwhile.
                        let _ = published.send(outcome);
                    }
                    .instrument(span),
                );
            }
        }

        true
    }

    fn render(
        &self,
        state: &State,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        let now = Instant::now();
        terminal.draw(|f| Self::draw(f, state, now))?;

        Ok(())
    }

    fn draw(f: &mut Frame, state: &State, now: Instant) {
        let widget = state.widget();
        let config = widget.config();

        let heading_lines = u16::from(config.title().is_some())
            + u16::from(config.description().is_some());
        let sections = layout::Sections {
            heading: if heading_lines > 0 {
                heading_lines + style::SPACE_Y
            } else {
                0
            },
            error: if widget.error().is_some() { 3 } else { 0 },
            detail: match state.form() {
                Some(_) => 9,
                None if state.uploaded().is_some() => 3,
                None => 0,
            },
        };
        let chunks = layout::layout_chunks(f.area(), &sections);

        // Heading
        let mut heading = Vec::with_capacity(2);
        if let Some(title) = config.title() {
            heading.push(Line::styled(title, style::heading_style()));
        }
        if let Some(description) = config.description() {
            heading.push(Line::styled(description, style::hint_style()));
        }
        f.render_widget(
            Paragraph::new(heading).alignment(Alignment::Center),
            chunks[layout::HEADING],
        );

        Self::draw_drop_area(f, widget, chunks[layout::DROP_AREA]);

        // Constraints
        f.render_widget(
            Paragraph::new(Line::styled(
                format!(
                    "Max size: {}MB • {}",
                    config.max_size_mb(),
                    config.kind().format_hint()
                ),
                style::hint_style(),
            ))
            .alignment(Alignment::Center),
            chunks[layout::CONSTRAINTS],
        );

        // Error banner
        if let Some(message) = widget.error() {
            f.render_widget(
                Paragraph::new(Line::styled(message, style::error_style()))
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(style::error_style())
                            .border_type(BorderType::Plain),
                    ),
                chunks[layout::ERROR],
            );
        }

        // Tips
        let tips = config
            .kind()
            .tips(config.max_size_mb())
            .into_iter()
            .map(|tip| Line::from(format!("• {tip}")))
            .collect::<Vec<_>>();
        f.render_widget(
            Paragraph::new(tips).style(style::hint_style()).block(
                Block::default()
                    .title(Span::styled(" Upload tips ", style::heading_style()))
                    .borders(Borders::TOP)
                    .border_style(style::border_style())
                    .border_type(BorderType::Plain),
            ),
            chunks[layout::TIPS],
        );

        match state.form() {
            Some(form) => Self::draw_form(f, form, state.is_publishing(), chunks[layout::DETAIL]),
            None => {
                if let Some(result) = state.uploaded() {
                    let location = if result.url.is_empty() {
                        result.file_path.as_str()
                    } else {
                        result.url.as_str()
                    };
                    f.render_widget(
                        Paragraph::new(location).block(
                            Block::default()
                                .title(Span::styled(" Uploaded ", style::heading_style()))
                                .borders(Borders::TOP)
                                .border_style(style::border_style()),
                        ),
                        chunks[layout::DETAIL],
                    );
                }
            }
        }

        // Notification
        if let Some(notification) = state.notifications().current(now) {
            f.render_widget(
                Paragraph::new(Line::styled(
                    notification.message.as_str(),
                    style::notification_style(notification.level),
                ))
                .alignment(Alignment::Center),
                chunks[layout::NOTIFICATION],
            );
        }

        // Prompt or key help
        let prompt = state.prompt();
        let footer = match prompt.field() {
            Some(field) => Line::from(vec![
                Span::styled(format!("{}: ", field.label()), style::key_style()),
                Span::raw(format!("{}█", prompt.buffer())),
                Span::styled("  Enter confirm  Esc cancel", style::hint_style()),
            ]),
            None => Self::key_help(state.form().is_some()),
        };
        f.render_widget(Paragraph::new(footer), chunks[layout::FOOTER]);
    }

    fn draw_drop_area(f: &mut Frame, widget: &UploadWidget, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style::drop_area_style(
                widget.state(),
                widget.is_drag_over(),
                widget.error().is_some(),
            ))
            .border_type(BorderType::Rounded);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let kind = widget.config().kind();

        match (widget.state(), widget.selected()) {
            (UploadState::Complete(_), _) => {
                f.render_widget(
                    Paragraph::new(vec![
                        Line::styled("✓ Upload Complete!", style::status_style(widget.state())),
                        Line::from(format!("Your {kind} has been successfully uploaded")),
                    ])
                    .alignment(Alignment::Center),
                    inner,
                );
            }
            (UploadState::Uploading { percent }, Some(file)) => {
                let rows = layout::uploading_layout(inner);
                f.render_widget(
                    Paragraph::new(Line::styled(
                        format!("Uploading {}", file.name()),
                        style::status_style(widget.state()),
                    ))
                    .alignment(Alignment::Center),
                    rows[0],
                );
                f.render_widget(
                    Gauge::default()
                        .gauge_style(style::gauge_style())
                        .use_unicode(true)
                        .percent(u16::from(*percent)),
                    rows[1],
                );
                f.render_widget(
                    Paragraph::new(format!(
                        "{percent}% ({})",
                        format_file_size(file.size())
                    ))
                    .alignment(Alignment::Center)
                    .style(style::hint_style()),
                    rows[2],
                );
            }
            (_, Some(file)) => {
                let action = if widget.error().is_some() {
                    "retry"
                } else {
                    "upload"
                };
                f.render_widget(
                    Paragraph::new(vec![
                        Line::styled(file.name(), style::heading_style()),
                        Line::styled(format_file_size(file.size()), style::hint_style()),
                        Line::from(vec![
                            Span::raw("Press "),
                            Span::styled("Enter", style::key_style()),
                            Span::raw(format!(" to {action}, ")),
                            Span::styled("x", style::key_style()),
                            Span::raw(" to clear"),
                        ]),
                    ])
                    .alignment(Alignment::Center),
                    inner,
                );
            }
            (_, None) => {
                let title = match kind {
                    MediaKind::Image => "Upload Image",
                    MediaKind::Video => "Upload Video",
                };
                f.render_widget(
                    Paragraph::new(vec![
                        Line::styled(title, style::heading_style()),
                        Line::from(vec![
                            Span::raw("Drag and drop your file here, or press "),
                            Span::styled("o", style::key_style()),
                            Span::raw(" to browse"),
                        ]),
                    ])
                    .alignment(Alignment::Center),
                    inner,
                );
            }
        }
    }

    fn draw_form(f: &mut Frame, form: &VideoForm, publishing: bool, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Video details ", style::heading_style()))
            .borders(Borders::TOP)
            .border_style(style::border_style())
            .border_type(BorderType::Plain);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(layout::form_layout())
            .split(inner);

        let mut fields = Vec::with_capacity(6);
        fields.push(Self::field_line(
            "Title",
            form.title(),
            "Enter video title",
            TITLE_MAX,
        ));
        if let Some(e) = form.title_error().filter(|_| !form.title().is_empty()) {
            fields.push(Line::styled(e.to_string(), style::error_style()));
        }
        fields.push(Self::field_line(
            "Description",
            form.description(),
            "Describe your video",
            DESCRIPTION_MAX,
        ));
        if let Some(e) = form
            .description_error()
            .filter(|_| !form.description().is_empty())
        {
            fields.push(Line::styled(e.to_string(), style::error_style()));
        }
        f.render_widget(
            Paragraph::new(fields).wrap(Wrap { trim: false }),
            columns[0],
        );

        let check = |done: bool, label: &'static str| {
            Line::styled(
                format!("{} {label}", if done { "✓" } else { "○" }),
                style::check_style(done),
            )
        };
        let ready = form.is_ready();
        let publish = if publishing {
            Line::styled("Publishing...", style::key_style())
        } else {
            Line::styled(" p  Publish Video ", style::publish_style(ready))
        };
        f.render_widget(
            Paragraph::new(vec![
                check(form.title_error().is_none(), "Title"),
                check(form.description_error().is_none(), "Description"),
                check(form.is_video_uploaded(), "Video uploaded"),
                Line::default(),
                publish,
            ]),
            columns[1],
        );
    }

    fn field_line<'a>(
        label: &'static str,
        value: &'a str,
        placeholder: &'static str,
        max: usize,
    ) -> Line<'a> {
        let counter = format!("({}/{max}): ", value.chars().count());
        let value = if value.is_empty() {
            Span::styled(placeholder, style::hint_style())
        } else {
            Span::raw(value)
        };
        Line::from(vec![
            Span::styled(format!("{label} "), style::heading_style()),
            Span::styled(counter, style::hint_style()),
            value,
        ])
    }

    fn key_help(with_form: bool) -> Line<'static> {
        let mut keys = vec![
            ("o", "open"),
            ("Enter", "upload"),
            ("x", "clear"),
        ];
        if with_form {
            keys.extend([("t", "title"), ("d", "description"), ("p", "publish")]);
        }
        keys.push(("q", "quit"));

        Line::from(
            keys.into_iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(key, style::key_style()),
                        Span::styled(format!(" {action}  "), style::hint_style()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }
}
