use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{validate, SelectedFile, UploadConfig, ValidationError};
use crate::transfer::{TransferEvent, TransferEventKind, UploadRequest, UploadResult};

/// How long the "complete" view stays up before the result is handed on.
pub const COMPLETE_DISPLAY_DELAY: Duration = Duration::from_millis(1500);

/// Receives what a widget produces: the final result, and progress while uploading.
pub trait UploadConsumer {
    fn on_upload_success(&mut self, result: &UploadResult);

    fn on_progress(&mut self, _percent: u8) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading { percent: u8 },
    Complete(UploadResult),
    Error(String),
}

/// Outcome of offering a file to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Staged,
    Rejected(ValidationError),
    /// The file chooser is disabled (an upload is running) or nothing was offered.
    Ignored,
}

/// A stored file's result waiting out the display delay. Survives selection
/// changes and clears: the file is stored either way.
struct PendingDelivery {
    due: Instant,
    result: UploadResult,
}

/// Lifecycle of one user-initiated file selection and upload.
pub struct UploadWidget {
    config: Arc<UploadConfig>,
    state: UploadState,
    selected: Option<SelectedFile>,
    /// Why the last offered file was refused. Shown alongside `Idle`.
    rejection: Option<String>,
    drag_over: bool,
    attempt: u64,
    last_reported: u8,
    delivery: Option<PendingDelivery>,
}

impl UploadWidget {
    pub fn new(config: Arc<UploadConfig>) -> Self {
        Self {
            config,
            state: UploadState::Idle,
            selected: None,
            rejection: None,
            drag_over: false,
            attempt: 0,
            last_reported: 0,
            delivery: None,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, UploadState::Uploading { .. })
    }

    /// The chooser and drop target are disabled while a transfer is running.
    pub fn can_choose_file(&self) -> bool {
        !self.is_uploading()
    }

    /// A staged file, or a failed transfer with its file still selected.
    pub fn can_start_upload(&self) -> bool {
        self.selected.is_some() && matches!(self.state, UploadState::Idle | UploadState::Error(_))
    }

    pub fn progress(&self) -> u8 {
        match self.state {
            UploadState::Uploading { percent } => percent,
            UploadState::Complete(_) => 100,
            UploadState::Idle | UploadState::Error(_) => 0,
        }
    }

    /// The transfer failure, or else the reason the last file was refused.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            UploadState::Error(message) => Some(message),
            _ => self.rejection.as_deref(),
        }
    }

    /// Offer a file chosen by the user. A staged file is replaced when the new
    /// one validates, and discarded when it does not. A refused file leaves the
    /// widget `Idle` with nothing selected.
    pub fn select(&mut self, file: SelectedFile) -> Selection {
        if !self.can_choose_file() {
            debug!(file = %file.name(), "Ignoring selection while uploading.");
            return Selection::Ignored;
        }

        match validate(&file, &self.config) {
            Ok(()) => {
                info!(file = %file.name(), size = file.size(), "File staged.");
                self.selected = Some(file);
                self.rejection = None;
                self.state = UploadState::Idle;
                Selection::Staged
            }
            Err(reason) => {
                warn!(file = %file.name(), media_type = %file.media_type(), "{reason}");
                self.selected = None;
                self.state = UploadState::Idle;
                self.rejection = Some(reason.to_string());
                Selection::Rejected(reason)
            }
        }
    }

    pub fn drag_enter(&mut self) {
        if self.can_choose_file() {
            self.drag_over = true;
        }
    }

    pub fn drag_leave(&mut self) {
        self.drag_over = false;
    }

    /// Equivalent to a manual selection of the first dropped file.
    pub fn drop_files(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> Selection {
        self.drag_over = false;

        match files.into_iter().next() {
            Some(file) => self.select(file),
            None => Selection::Ignored,
        }
    }

    /// Begin a new attempt with the selected file. Returns the request the
    /// transfer delegate should run, or `None` when there is nothing to upload.
    pub fn start_upload(&mut self) -> Option<UploadRequest> {
        if !self.can_start_upload() {
            return None;
        }
        let file = self.selected.clone()?;

        self.attempt += 1;
        self.last_reported = 0;
        self.state = UploadState::Uploading { percent: 0 };

        info!(attempt = self.attempt, file = %file.name(), "Upload started.");

        Some(UploadRequest {
            attempt: self.attempt,
            file,
            folder: self.config.folder().to_owned(),
            file_name: self.config.file_name().to_owned(),
            unique_name: true,
        })
    }

    /// Apply one event from the transfer delegate. Events belonging to any
    /// attempt other than the current one are dropped.
    pub fn handle_event(
        &mut self,
        event: TransferEvent,
        now: Instant,
        consumer: &mut impl UploadConsumer,
    ) {
        if event.attempt != self.attempt || !self.is_uploading() {
            debug!(
                attempt = event.attempt,
                current = self.attempt,
                "Dropping stale transfer event."
            );
            return;
        }

        match event.kind {
            TransferEventKind::Progress { loaded, total } => {
                let Some(percent) = percent_of(loaded, total) else {
                    return;
                };
                let percent = percent.max(self.progress());
                self.state = UploadState::Uploading { percent };
                self.last_reported = percent;
                consumer.on_progress(percent);
            }
            TransferEventKind::Succeeded(result) => {
                if self.last_reported < 100 {
                    self.last_reported = 100;
                    consumer.on_progress(100);
                }
                // An earlier result still waiting out its delay goes first.
                if let Some(earlier) = self.delivery.take() {
                    consumer.on_upload_success(&earlier.result);
                }
                self.state = UploadState::Complete(result.clone());
                self.delivery = Some(PendingDelivery {
                    due: now + COMPLETE_DISPLAY_DELAY,
                    result,
                });
            }
            TransferEventKind::Failed(message) => {
                self.state = UploadState::Error(message);
            }
        }
    }

    /// When the pending delivery is due, forward the result once. This holds
    /// even if the widget moved on since the upload completed.
    pub fn poll_delivery(&mut self, now: Instant, consumer: &mut impl UploadConsumer) -> bool {
        if self.delivery_due().map_or(true, |due| now < due) {
            return false;
        }
        let Some(delivery) = self.delivery.take() else {
            return false;
        };

        consumer.on_upload_success(&delivery.result);
        true
    }

    pub fn delivery_due(&self) -> Option<Instant> {
        self.delivery.as_ref().map(|delivery| delivery.due)
    }

    /// Drop the selection and return to idle. A transfer still in flight is
    /// superseded: its remaining events are ignored. A completed upload still
    /// waiting out its delay is delivered regardless.
    pub fn clear(&mut self) {
        if self.is_uploading() {
            info!(attempt = self.attempt, "Upload abandoned by clearing the selection.");
            self.attempt += 1;
        }
        self.selected = None;
        self.rejection = None;
        self.state = UploadState::Idle;
        self.drag_over = false;
        self.last_reported = 0;
    }
}

/// `round(loaded / total * 100)` clamped to `0..=100`, or `None` when the
/// total is not known.
fn percent_of(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = u128::from(total.filter(|total| *total > 0)?);
    let percent = (u128::from(loaded) * 100 + total / 2) / total;
    Some(percent.min(100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::MediaKind;

    const MB: u64 = 1024 * 1024;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u8>,
        results: Vec<UploadResult>,
    }

    impl UploadConsumer for Recorder {
        fn on_upload_success(&mut self, result: &UploadResult) {
            self.results.push(result.clone());
        }

        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }
    }

    fn widget(kind: MediaKind, max_mb: u64) -> UploadWidget {
        UploadWidget::new(Arc::new(UploadConfig::new(kind, Some(max_mb))))
    }

    fn jpeg(size: u64) -> SelectedFile {
        SelectedFile::new("abc.jpg", "/tmp/abc.jpg", size, "image/jpeg")
    }

    fn progress(attempt: u64, loaded: u64, total: Option<u64>) -> TransferEvent {
        TransferEvent {
            attempt,
            kind: TransferEventKind::Progress { loaded, total },
        }
    }

    fn succeeded(attempt: u64, path: &str) -> TransferEvent {
        TransferEvent {
            attempt,
            kind: TransferEventKind::Succeeded(UploadResult::new(path)),
        }
    }

    fn failed(attempt: u64, message: &str) -> TransferEvent {
        TransferEvent {
            attempt,
            kind: TransferEventKind::Failed(message.into()),
        }
    }

    #[test]
    fn image_upload_walkthrough() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        let now = Instant::now();

        assert_eq!(widget.select(jpeg(3 * MB)), Selection::Staged);
        assert_eq!(widget.state(), &UploadState::Idle);
        assert_eq!(widget.selected().map(SelectedFile::name), Some("abc.jpg"));

        let request = widget.start_upload().expect("request");
        assert_eq!(request.folder, "/images");
        assert!(request.unique_name);
        assert_eq!(widget.state(), &UploadState::Uploading { percent: 0 });

        widget.handle_event(progress(request.attempt, 30, Some(100)), now, &mut parent);
        assert_eq!(widget.progress(), 30);
        widget.handle_event(progress(request.attempt, 100, Some(100)), now, &mut parent);
        assert_eq!(widget.progress(), 100);

        widget.handle_event(succeeded(request.attempt, "/images/abc.jpg"), now, &mut parent);
        assert!(matches!(widget.state(), UploadState::Complete(_)));
        assert_eq!(parent.progress, vec![30, 100]);

        assert!(!widget.poll_delivery(now + Duration::from_millis(1499), &mut parent));
        assert!(parent.results.is_empty());

        assert!(widget.poll_delivery(now + COMPLETE_DISPLAY_DELAY, &mut parent));
        assert!(!widget.poll_delivery(now + Duration::from_secs(10), &mut parent));
        assert_eq!(parent.results, vec![UploadResult::new("/images/abc.jpg")]);
        assert_eq!(widget.delivery_due(), None);
    }

    #[test]
    fn invalid_type_is_rejected_without_staging() {
        let mut widget = widget(MediaKind::Video, 100);

        let selection = widget.select(SelectedFile::new(
            "setup.exe",
            "/tmp/setup.exe",
            8 * MB,
            "application/x-msdownload",
        ));

        assert!(matches!(selection, Selection::Rejected(ValidationError::InvalidType { .. })));
        assert_eq!(widget.state(), &UploadState::Idle);
        assert!(widget.selected().is_none());
        assert_eq!(widget.error(), Some("Please upload a valid video file"));
        assert_eq!(widget.start_upload(), None);
    }

    #[test]
    fn oversized_file_never_reaches_the_delegate() {
        let mut widget = widget(MediaKind::Video, 100);

        let selection = widget.select(SelectedFile::new(
            "big.mp4",
            "/tmp/big.mp4",
            150 * MB,
            "video/mp4",
        ));

        let Selection::Rejected(reason) = selection else {
            panic!("expected rejection");
        };
        assert!(reason.to_string().contains("100MB"));
        assert_eq!(widget.start_upload(), None);
    }

    #[test]
    fn rejected_reselection_discards_staged_file() {
        let mut widget = widget(MediaKind::Image, 5);
        widget.select(jpeg(MB));

        widget.select(SelectedFile::new("a.txt", "/tmp/a.txt", 1, "text/plain"));

        assert!(widget.selected().is_none());
        assert!(widget.error().is_some());
    }

    #[test]
    fn valid_reselection_replaces_staged_file() {
        let mut widget = widget(MediaKind::Image, 5);
        widget.select(jpeg(MB));

        let png = SelectedFile::new("b.png", "/tmp/b.png", 2 * MB, "image/png");
        assert_eq!(widget.select(png.clone()), Selection::Staged);
        assert_eq!(widget.selected(), Some(&png));
    }

    #[test]
    fn valid_file_after_rejection_clears_the_reason() {
        let mut widget = widget(MediaKind::Image, 5);
        widget.select(SelectedFile::new("a.txt", "/tmp/a.txt", 1, "text/plain"));
        assert!(widget.error().is_some());

        assert_eq!(widget.select(jpeg(MB)), Selection::Staged);
        assert_eq!(widget.error(), None);
    }

    #[test]
    fn unknown_length_progress_is_ignored() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;

        widget.handle_event(progress(attempt, 500, None), Instant::now(), &mut parent);
        widget.handle_event(progress(attempt, 500, Some(0)), Instant::now(), &mut parent);

        assert_eq!(widget.state(), &UploadState::Uploading { percent: 0 });
        assert!(parent.progress.is_empty());
    }

    #[test]
    fn progress_never_goes_backwards_and_is_clamped() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;
        let now = Instant::now();

        for (loaded, total) in [(10, 40), (5, 40), (2, 3), (90, 80)] {
            widget.handle_event(progress(attempt, loaded, Some(total)), now, &mut parent);
        }

        assert_eq!(parent.progress, vec![25, 25, 67, 100]);
        assert!(parent.progress.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn success_without_final_progress_still_reports_full() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;
        let now = Instant::now();

        widget.handle_event(progress(attempt, 1, Some(2)), now, &mut parent);
        widget.handle_event(succeeded(attempt, "/images/x.jpg"), now, &mut parent);

        assert_eq!(parent.progress, vec![50, 100]);
        assert_eq!(widget.progress(), 100);
    }

    #[test]
    fn transfer_failure_keeps_selection_for_retry() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        widget.select(jpeg(MB));
        let first = widget.start_upload().expect("request").attempt;
        let now = Instant::now();

        widget.handle_event(progress(first, 60, Some(100)), now, &mut parent);
        widget.handle_event(failed(first, "Network error"), now, &mut parent);

        assert_eq!(widget.state(), &UploadState::Error("Network error".into()));
        assert!(widget.selected().is_some());
        assert_eq!(widget.progress(), 0);

        let retry = widget.start_upload().expect("retry");
        assert_eq!(retry.attempt, first + 1);
        assert_eq!(widget.state(), &UploadState::Uploading { percent: 0 });
        assert_eq!(widget.error(), None);
    }

    #[test]
    fn selection_is_locked_while_uploading() {
        let mut widget = widget(MediaKind::Image, 5);
        widget.select(jpeg(MB));
        widget.start_upload().expect("request");

        let other = SelectedFile::new("c.png", "/tmp/c.png", 1, "image/png");
        assert_eq!(widget.select(other.clone()), Selection::Ignored);
        assert_eq!(widget.drop_files([other]), Selection::Ignored);
        assert_eq!(widget.selected().map(SelectedFile::name), Some("abc.jpg"));
        assert_eq!(widget.start_upload(), None);

        widget.drag_enter();
        assert!(!widget.is_drag_over());
    }

    #[test]
    fn drop_takes_first_file_and_resets_drag_flag() {
        let mut widget = widget(MediaKind::Image, 5);

        widget.drag_enter();
        assert!(widget.is_drag_over());
        widget.drag_leave();
        assert!(!widget.is_drag_over());

        widget.drag_enter();
        let second = SelectedFile::new("second.png", "/tmp/second.png", 1, "image/png");
        assert_eq!(widget.drop_files([jpeg(MB), second]), Selection::Staged);
        assert!(!widget.is_drag_over());
        assert_eq!(widget.selected().map(SelectedFile::name), Some("abc.jpg"));

        assert_eq!(widget.drop_files(Vec::new()), Selection::Ignored);
    }

    #[test]
    fn dropped_file_is_validated() {
        let mut widget = widget(MediaKind::Video, 100);

        let selection = widget.drop_files([jpeg(MB)]);

        assert!(matches!(selection, Selection::Rejected(_)));
        assert!(widget.selected().is_none());
    }

    #[test]
    fn clear_from_any_state_returns_to_idle() {
        let now = Instant::now();
        let mut parent = Recorder::default();

        let mut staged = widget(MediaKind::Image, 5);
        staged.select(jpeg(MB));

        let mut uploading = widget(MediaKind::Image, 5);
        uploading.select(jpeg(MB));
        let attempt = uploading.start_upload().expect("request").attempt;
        uploading.handle_event(progress(attempt, 40, Some(100)), now, &mut parent);

        let mut complete = widget(MediaKind::Image, 5);
        complete.select(jpeg(MB));
        let attempt = complete.start_upload().expect("request").attempt;
        complete.handle_event(succeeded(attempt, "/images/a.jpg"), now, &mut parent);

        let mut errored = widget(MediaKind::Image, 5);
        errored.select(SelectedFile::new("a.txt", "/tmp/a.txt", 1, "text/plain"));

        for mut widget in [staged, uploading, complete, errored] {
            widget.drag_enter();
            widget.clear();
            assert_eq!(widget.state(), &UploadState::Idle);
            assert!(widget.selected().is_none());
            assert_eq!(widget.progress(), 0);
            assert_eq!(widget.error(), None);
            assert!(!widget.is_drag_over());
        }
    }

    #[test]
    fn clearing_before_delivery_still_delivers() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        let now = Instant::now();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;
        widget.handle_event(succeeded(attempt, "/images/a.jpg"), now, &mut parent);

        widget.clear();

        assert!(!widget.poll_delivery(now + Duration::from_millis(100), &mut parent));
        assert!(widget.poll_delivery(now + Duration::from_secs(5), &mut parent));
        assert!(!widget.poll_delivery(now + Duration::from_secs(6), &mut parent));
        assert_eq!(parent.results, vec![UploadResult::new("/images/a.jpg")]);
    }

    #[test]
    fn choosing_next_file_before_delivery_still_delivers() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        let now = Instant::now();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;
        widget.handle_event(succeeded(attempt, "/images/a.jpg"), now, &mut parent);

        let next = SelectedFile::new("b.png", "/tmp/b.png", MB, "image/png");
        assert_eq!(widget.select(next), Selection::Staged);
        assert_eq!(widget.state(), &UploadState::Idle);

        assert!(widget.poll_delivery(now + Duration::from_secs(5), &mut parent));
        assert_eq!(parent.results, vec![UploadResult::new("/images/a.jpg")]);
    }

    #[test]
    fn dropping_and_uploading_next_file_before_delivery_delivers_both_once() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        let now = Instant::now();
        widget.select(jpeg(MB));
        let first = widget.start_upload().expect("request").attempt;
        widget.handle_event(succeeded(first, "/images/a.jpg"), now, &mut parent);

        widget.drop_files([SelectedFile::new("b.png", "/tmp/b.png", MB, "image/png")]);
        let second = widget.start_upload().expect("request").attempt;
        widget.handle_event(succeeded(second, "/images/b.png"), now, &mut parent);

        // The first result is forwarded as soon as the second one completes.
        assert_eq!(parent.results, vec![UploadResult::new("/images/a.jpg")]);

        assert!(widget.poll_delivery(now + COMPLETE_DISPLAY_DELAY, &mut parent));
        assert_eq!(
            parent.results,
            vec![
                UploadResult::new("/images/a.jpg"),
                UploadResult::new("/images/b.png")
            ]
        );
    }

    #[test]
    fn events_from_superseded_attempt_are_ignored() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        let now = Instant::now();
        widget.select(jpeg(MB));
        let abandoned = widget.start_upload().expect("request").attempt;
        widget.clear();

        widget.select(jpeg(MB));
        let current = widget.start_upload().expect("request").attempt;
        assert_ne!(abandoned, current);

        widget.handle_event(progress(abandoned, 90, Some(100)), now, &mut parent);
        widget.handle_event(succeeded(abandoned, "/images/old.jpg"), now, &mut parent);

        assert_eq!(widget.state(), &UploadState::Uploading { percent: 0 });
        assert!(parent.progress.is_empty());
    }

    #[test]
    fn complete_upload_needs_clear_before_next_attempt() {
        let mut widget = widget(MediaKind::Image, 5);
        let mut parent = Recorder::default();
        widget.select(jpeg(MB));
        let attempt = widget.start_upload().expect("request").attempt;
        widget.handle_event(succeeded(attempt, "/images/a.jpg"), Instant::now(), &mut parent);

        assert_eq!(widget.start_upload(), None);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1, Some(200)), Some(1));
        assert_eq!(percent_of(1, Some(201)), Some(0));
        assert_eq!(percent_of(0, Some(10)), Some(0));
        assert_eq!(percent_of(u64::MAX, Some(u64::MAX)), Some(100));
        assert_eq!(percent_of(10, None), None);
    }
}
