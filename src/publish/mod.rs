pub mod api;
pub mod form;

pub use api::{ApiError, Session, Video, VideosClient};
pub use form::{FormConsumer, FormError, VideoDraft, VideoForm};
