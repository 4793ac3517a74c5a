use super::{MediaKind, SelectedFile, UploadConfig};

/// Reasons a selected file is refused before any transfer starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", invalid_type_message(.kind))]
    InvalidType { kind: MediaKind, media_type: String },

    #[error("{} size must be less than {max_mb}MB", size_subject(.kind))]
    TooLarge { kind: MediaKind, size: u64, max_mb: u64 },
}

fn invalid_type_message(kind: &MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "Please upload a valid image file (JPEG, PNG, WebP, or GIF)",
        MediaKind::Video => "Please upload a valid video file",
    }
}

fn size_subject(kind: &MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "File",
        MediaKind::Video => "Video",
    }
}

/// Gate a file against the widget configuration. Type is checked before size.
pub fn validate(file: &SelectedFile, config: &UploadConfig) -> Result<(), ValidationError> {
    if !config.allows(file.media_type()) {
        return Err(ValidationError::InvalidType {
            kind: config.kind(),
            media_type: file.media_type().to_owned(),
        });
    }

    if file.size() > config.max_size_bytes() {
        return Err(ValidationError::TooLarge {
            kind: config.kind(),
            size: file.size(),
            max_mb: config.max_size_mb(),
        });
    }

    Ok(())
}
