use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{
    multipart::{Form, Part},
    Body, Client,
};
use serde::Deserialize;
use tokio::{fs::File, io::AsyncReadExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, trace, warn};

use super::{ProgressSink, TransferDelegate, TransferError, UploadRequest, UploadResult};

pub const DEFAULT_ENDPOINT: &str = "https://upload.imagekit.io/api/v1/files/upload";

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploads to an ImageKit-compatible endpoint as `multipart/form-data`,
/// streaming the file from disk and reporting every chunk handed to the body.
pub struct ImageKitDelegate {
    client: Client,
    endpoint: String,
    private_key: String,
}

impl ImageKitDelegate {
    pub fn new(endpoint: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            private_key: private_key.into(),
        }
    }
}

#[async_trait]
impl TransferDelegate for ImageKitDelegate {
    #[instrument(skip(self, progress), fields(endpoint = %self.endpoint))]
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: ProgressSink,
    ) -> Result<UploadResult, TransferError> {
        let file = File::open(request.file.path()).await?;
        // The file may have changed since it was staged; declare what is there now.
        let total = file.metadata().await?.len();
        if total != request.file.size() {
            warn!(
                staged = request.file.size(),
                current = total,
                "File size changed since it was selected."
            );
        }

        progress.report(0, Some(total));

        let mut sent = 0u64;
        // Never send more than declared, even if the file keeps growing.
        let body = ReaderStream::new(file.take(total)).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent = sent.saturating_add(bytes.len() as u64);
                progress.report(sent.min(total), Some(total));
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(request.file.name().to_owned())
            .mime_str(request.file.media_type())?;

        let form = Form::new()
            .part("file", part)
            .text("fileName", request.file_name.clone())
            .text("folder", request.folder.clone())
            .text("useUniqueFileName", request.unique_name.to_string());

        debug!("Posting {} bytes...", total);
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.private_key, None::<&str>)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        trace!(%status, upload_response_text = %response_text);

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("Upload rejected with status {status}"));
            return Err(TransferError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&response_text)?)
    }
}
