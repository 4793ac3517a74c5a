use std::fmt::Display;

use clap::ValueEnum;

const BYTES_PER_MB: u64 = 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

// `video/avi` and `video/mov` are what browsers report; the registered names are
// what extension guessing yields for the same containers.
const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/avi",
    "video/x-msvideo",
    "video/mov",
    "video/quicktime",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn default_max_size_mb(self) -> u64 {
        match self {
            Self::Image => 5,
            Self::Video => 100,
        }
    }

    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_TYPES,
            Self::Video => VIDEO_TYPES,
        }
    }

    /// Human-readable list of accepted formats, as shown next to the size limit.
    pub fn format_hint(self) -> &'static str {
        match self {
            Self::Image => "JPEG, PNG, WebP, GIF",
            Self::Video => "MP4, WebM, OGG, AVI, MOV",
        }
    }

    /// Destination folder on the media store.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Image => "/images",
            Self::Video => "/videos",
        }
    }

    /// Base file name requested from the media store. A unique suffix is always requested.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    pub fn tips(self, max_size_mb: u64) -> [String; 3] {
        match self {
            Self::Image => [
                "Best quality: High resolution images (1920px+ width)".into(),
                "Recommended formats: JPEG for photos, PNG for graphics".into(),
                "WebP format offers great quality with smaller file sizes".into(),
            ],
            Self::Video => [
                "Best quality: 1080p or higher resolution".into(),
                "Recommended formats: MP4, WebM for best compatibility".into(),
                format!("Keep file size under {max_size_mb}MB for faster uploads"),
            ],
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Widget configuration, fully resolved at construction and read-only afterwards.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    kind: MediaKind,
    max_size_mb: u64,
    title: Option<String>,
    description: Option<String>,
}

impl UploadConfig {
    pub fn new(kind: MediaKind, max_size_mb: Option<u64>) -> Self {
        Self {
            kind,
            max_size_mb: max_size_mb.unwrap_or_else(|| kind.default_max_size_mb()),
            title: None,
            description: None,
        }
    }

    pub fn with_heading(mut self, title: Option<String>, description: Option<String>) -> Self {
        self.title = title;
        self.description = description;
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn max_size_mb(&self) -> u64 {
        self.max_size_mb
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn allowed_types(&self) -> &'static [&'static str] {
        self.kind.allowed_types()
    }

    pub fn allows(&self, media_type: &str) -> bool {
        let media_type = media_type.to_ascii_lowercase();
        self.allowed_types().iter().any(|allowed| *allowed == media_type)
    }

    pub fn folder(&self) -> &'static str {
        self.kind.folder()
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
