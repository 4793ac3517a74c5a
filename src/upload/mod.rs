pub mod config;
pub mod drop;
pub mod file;
pub mod validate;
pub mod widget;

pub use config::{MediaKind, UploadConfig};
pub use file::SelectedFile;
pub use validate::{validate, ValidationError};
pub use widget::{Selection, UploadConsumer, UploadState, UploadWidget};
