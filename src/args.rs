use std::path::PathBuf;

use clap::{arg, command, Parser, Subcommand};

use crate::{transfer::imagekit::DEFAULT_ENDPOINT, upload::MediaKind};

pub fn parse() -> Args {
    Args::parse()
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity,

    /// Export traces via OTLP over HTTP
    #[arg(long, global = true)]
    pub otlp_export: bool,

    /// UI refresh interval in milliseconds
    #[arg(short, long, global = true, default_value_t = 50)]
    pub tick: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload an image or video, then publish the video
    Upload(UploadArgs),

    /// List the latest published videos
    Feed(BackendArgs),
}

#[derive(Debug, clap::Args)]
pub struct UploadArgs {
    /// File to stage right away
    #[arg()]
    pub file: Option<PathBuf>,

    /// Kind of media to accept
    #[arg(long, value_enum, default_value_t = MediaKind::Video)]
    pub kind: MediaKind,

    /// Size limit in MB [default: 5 for images, 100 for videos]
    #[arg(long)]
    pub max_size_mb: Option<u64>,

    /// Heading shown above the drop area
    #[arg(long)]
    pub widget_title: Option<String>,

    /// Text shown below the heading
    #[arg(long)]
    pub widget_description: Option<String>,

    /// Prefill the video title
    #[arg(long)]
    pub title: Option<String>,

    /// Prefill the video description
    #[arg(long)]
    pub description: Option<String>,

    /// Media store upload endpoint
    #[arg(long, env = "IMAGEKIT_UPLOAD_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Media store private API key
    #[arg(long, env = "IMAGEKIT_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Debug, clap::Args)]
pub struct BackendArgs {
    /// Base URL of the video sharing backend
    #[arg(long, env = "REELS_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    /// Session cookie forwarded to the backend, e.g. `next-auth.session-token=...`
    #[arg(long, env = "REELS_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,
}
