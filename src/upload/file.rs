use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use tracing::debug;

/// The file currently chosen in an upload widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    path: PathBuf,
    size: u64,
    media_type: String,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            media_type: media_type.into(),
        }
    }

    /// Stat a local file and guess its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .wrap_err_with(|| format!("Could not read '{}'", path.display()))?;

        if !metadata.is_file() {
            return Err(eyre!("'{}' is not a file", path.display()));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();

        debug!(?path, size = metadata.len(), %media_type, "Loaded file metadata");

        Ok(Self::new(name, path, metadata.len(), media_type))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn from_path_reads_size_and_guesses_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.mp4");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(&[0u8; 2048]).expect("write");

        let selected = SelectedFile::from_path(&path).await.expect("selected");

        assert_eq!(selected.name(), "clip.mp4");
        assert_eq!(selected.size(), 2048);
        assert_eq!(selected.media_type(), "video/mp4");
        assert_eq!(selected.path(), path.as_path());
    }

    #[tokio::test]
    async fn unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob.zzzunknown");
        std::fs::write(&path, b"x").expect("write");

        let selected = SelectedFile::from_path(&path).await.expect("selected");

        assert_eq!(selected.media_type(), "application/octet-stream");
    }

    #[tokio::test]
    async fn directories_are_refused() {
        let dir = tempfile::tempdir().expect("tempdir");

        assert!(SelectedFile::from_path(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = SelectedFile::from_path(dir.path().join("nope.mp4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.mp4"));
    }
}
