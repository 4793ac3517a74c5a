use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue, COOKIE},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::VideoDraft;

/// Session credentials of the signed-in user, forwarded verbatim.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cookie: Option<String>,
}

impl Session {
    pub fn new(cookie: Option<String>) -> Self {
        Self { cookie }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from the server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session cookie is not a valid header value")]
    InvalidSession(#[from] InvalidHeaderValue),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the video endpoints of the sharing backend.
#[derive(Debug, Clone)]
pub struct VideosClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl VideosClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            session,
        }
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_video(&self, draft: &VideoDraft) -> Result<Video, ApiError> {
        let response = self
            .request(Method::POST, "/api/videos")?
            .json(draft)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip(self))]
    pub async fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        let response = self.request(Method::GET, "/api/videos")?.send().await?;

        read_json(response).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.session.cookie() {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }

        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "Backend request");

        Ok(self.client.request(method, url).headers(headers))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let response_text = response.text().await?;
    trace!(%status, %response_text);

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&response_text)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("Request failed with status {status}"));
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&response_text)?)
}
