use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, error, info, info_span, Instrument};

use crate::upload::SelectedFile;

pub mod imagekit;

pub use imagekit::ImageKitDelegate;

/// Location of a stored file, as returned by the media store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub file_path: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl UploadResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_id: String::new(),
            name: String::new(),
            url: String::new(),
            file_path: file_path.into(),
            thumbnail_url: None,
        }
    }
}

/// Everything a delegate needs to perform one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub attempt: u64,
    pub file: SelectedFile,
    pub folder: String,
    pub file_name: String,
    pub unique_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub attempt: u64,
    pub kind: TransferEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEventKind {
    /// `total` is `None` when the length is not known.
    Progress { loaded: u64, total: Option<u64> },
    Succeeded(UploadResult),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Could not read the file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from the media store: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Handle a delegate uses to report bytes sent for the attempt it is running.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    attempt: u64,
    events: UnboundedSender<TransferEvent>,
}

impl ProgressSink {
    pub fn new(attempt: u64, events: UnboundedSender<TransferEvent>) -> Self {
        Self { attempt, events }
    }

    pub fn report(&self, loaded: u64, total: Option<u64>) {
        // The receiver is gone once the UI shut down; nothing left to inform.
        let _ = self.events.send(TransferEvent {
            attempt: self.attempt,
            kind: TransferEventKind::Progress { loaded, total },
        });
    }
}

/// Performs the actual byte transfer to storage.
#[async_trait]
pub trait TransferDelegate: Send + Sync {
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: ProgressSink,
    ) -> Result<UploadResult, TransferError>;
}

/// Run one upload attempt on its own task. Progress and exactly one terminal
/// event are delivered through `events`, tagged with the request's attempt.
pub fn spawn(
    delegate: Arc<dyn TransferDelegate>,
    request: UploadRequest,
    events: UnboundedSender<TransferEvent>,
) -> JoinHandle<()> {
    let span = info_span!("upload", attempt = request.attempt, file = %request.file.name());

    tokio::spawn(
        async move {
            let attempt = request.attempt;
            let sink = ProgressSink::new(attempt, events.clone());

            let kind = match delegate.upload(&request, sink).await {
                Ok(result) => {
                    info!(file_path = %result.file_path, "Upload finished.");
                    TransferEventKind::Succeeded(result)
                }
                Err(e) => {
                    error!("Upload failed: {e}");
                    TransferEventKind::Failed(e.to_string())
                }
            };

            if events.send(TransferEvent { attempt, kind }).is_err() {
                debug!("Event loop is gone, dropping upload outcome.");
            }
        }
        .instrument(span),
    )
}
