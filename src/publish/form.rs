use serde::Serialize;
use tokio::time::Instant;

use crate::{
    notify::{Level, Notifications},
    transfer::UploadResult,
    upload::UploadConsumer,
};

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Title must be at least 3 characters")]
    TitleTooShort,
    #[error("Title must be less than 100 characters")]
    TitleTooLong,
    #[error("Description is required")]
    DescriptionRequired,
    #[error("Description must be at least 10 characters")]
    DescriptionTooShort,
    #[error("Description must be less than 500 characters")]
    DescriptionTooLong,
    #[error("Please upload a video first")]
    VideoMissing,
}

/// What the backend receives when a video is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Default)]
pub struct VideoForm {
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    upload_progress: u8,
}

impl VideoForm {
    pub fn new(title: Option<String>, description: Option<String>) -> Self {
        let mut form = Self::default();
        form.set_title(title.unwrap_or_default());
        form.set_description(description.unwrap_or_default());
        form
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Input is capped at the field's maximum length.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = truncate_chars(title.into(), TITLE_MAX);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = truncate_chars(description.into(), DESCRIPTION_MAX);
    }

    pub fn title_error(&self) -> Option<FormError> {
        check_length(
            &self.title,
            TITLE_MIN,
            TITLE_MAX,
            [
                FormError::TitleRequired,
                FormError::TitleTooShort,
                FormError::TitleTooLong,
            ],
        )
    }

    pub fn description_error(&self) -> Option<FormError> {
        check_length(
            &self.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
            [
                FormError::DescriptionRequired,
                FormError::DescriptionTooShort,
                FormError::DescriptionTooLong,
            ],
        )
    }

    pub fn video_url(&self) -> Option<&str> {
        Some(self.video_url.as_str()).filter(|url| !url.is_empty())
    }

    pub fn is_video_uploaded(&self) -> bool {
        self.video_url().is_some()
    }

    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    pub fn set_upload_progress(&mut self, percent: u8) {
        self.upload_progress = percent;
    }

    /// Keep the stored file's path, falling back to it when there is no thumbnail.
    pub fn attach_video(&mut self, result: &UploadResult) {
        self.video_url = result.file_path.clone();
        self.thumbnail_url = result
            .thumbnail_url
            .clone()
            .filter(|thumbnail| !thumbnail.is_empty())
            .unwrap_or_else(|| result.file_path.clone());
    }

    /// Whether the publish action should be enabled.
    pub fn is_ready(&self) -> bool {
        !self.title.is_empty() && !self.description.is_empty() && self.is_video_uploaded()
    }

    pub fn draft(&self) -> Result<VideoDraft, FormError> {
        if let Some(error) = self.title_error().or_else(|| self.description_error()) {
            return Err(error);
        }
        if !self.is_video_uploaded() {
            return Err(FormError::VideoMissing);
        }

        Ok(VideoDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            video_url: self.video_url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn truncate_chars(mut value: String, max: usize) -> String {
    if let Some((index, _)) = value.char_indices().nth(max) {
        value.truncate(index);
    }
    value
}

fn check_length(
    value: &str,
    min: usize,
    max: usize,
    [required, too_short, too_long]: [FormError; 3],
) -> Option<FormError> {
    let len = value.chars().count();
    if len == 0 {
        Some(required)
    } else if len < min {
        Some(too_short)
    } else if len > max {
        Some(too_long)
    } else {
        None
    }
}

/// Binds a form to an upload widget as its parent, posting to the shared notifications.
pub struct FormConsumer<'a> {
    pub form: &'a mut VideoForm,
    pub notifications: &'a mut Notifications,
    pub now: Instant,
}

impl UploadConsumer for FormConsumer<'_> {
    fn on_upload_success(&mut self, result: &UploadResult) {
        self.form.attach_video(result);
        self.notifications
            .show("Video uploaded successfully!", Level::Success, self.now);
    }

    fn on_progress(&mut self, percent: u8) {
        self.form.set_upload_progress(percent);
    }
}
