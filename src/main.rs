use std::{io, sync::Arc};

use color_eyre::eyre::Result;
use tracing::info;

use args::{Args, Command, UploadArgs};
use error::color_eyre_install;
use publish::{Session, VideoForm, VideosClient};
use state::State;
use transfer::ImageKitDelegate;
use ui::{Services, Ui};
use upload::{SelectedFile, UploadConfig};

mod args;
mod error;
mod feed;
mod notify;
mod publish;
mod state;
mod trace;
mod transfer;
mod ui;
mod upload;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre_install()?;

    let args = args::parse();

    let _appender_guard = trace::init(&args)?;

    match args.command {
        Command::Upload(ref upload) => run_upload(upload, &args).await,
        Command::Feed(ref backend) => {
            let client = VideosClient::new(
                backend.api_url.as_str(),
                Session::new(backend.session_cookie.clone()),
            );
            feed::print_feed(&client, &mut io::stdout()).await
        }
    }
}

async fn run_upload(upload: &UploadArgs, args: &Args) -> Result<()> {
    let config = UploadConfig::new(upload.kind, upload.max_size_mb)
        .with_heading(upload.widget_title.clone(), upload.widget_description.clone());
    let form = VideoForm::new(upload.title.clone(), upload.description.clone());

    let mut state = State::new(config, Some(form));

    if let Some(path) = &upload.file {
        // A rejected file shows up in the widget's error banner.
        state.select(SelectedFile::from_path(path).await?);
    }

    let services = Services {
        delegate: Arc::new(ImageKitDelegate::new(
            upload.endpoint.as_str(),
            upload.private_key.as_str(),
        )),
        videos: VideosClient::new(
            upload.backend.api_url.as_str(),
            Session::new(upload.backend.session_cookie.clone()),
        ),
    };

    info!(kind = %upload.kind, "Opening upload page.");
    Ui::new().event_loop(&mut state, &services, args.tick).await
}
