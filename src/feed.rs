use std::io::Write;

use color_eyre::eyre::Result;
use tracing::info;

use crate::publish::{Video, VideosClient};

/// Print the latest videos, as the feed page lists them.
pub async fn print_feed(client: &VideosClient, out: &mut impl Write) -> Result<()> {
    let videos = client.list_videos().await?;
    info!(count = videos.len(), "Fetched feed.");

    write_feed(&videos, out)?;

    Ok(())
}

fn write_feed(videos: &[Video], out: &mut impl Write) -> std::io::Result<()> {
    if videos.is_empty() {
        writeln!(out, "Video Collection")?;
        writeln!(out)?;
        writeln!(out, "No videos available")?;
        writeln!(
            out,
            "It looks like there are no videos to display right now. \
             Check back later or try uploading some content!"
        )?;
        return Ok(());
    }

    writeln!(out, "Latest Videos")?;
    let noun = if videos.len() == 1 { "video" } else { "videos" };
    writeln!(out, "Discover {} amazing {noun}", videos.len())?;

    for video in videos {
        writeln!(out)?;
        writeln!(out, "{}", video.title)?;
        writeln!(out, "  {}", video.description)?;
        writeln!(out, "  {}", video.video_url)?;
    }

    Ok(())
}
