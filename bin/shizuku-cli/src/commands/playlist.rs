use std::path::PathBuf;

use clap::Parser;
use shizuku::hls::stream_wrapper;

/// Write a master playlist pointing at a single media playlist.
#[derive(Parser, Clone)]
#[clap(name = "playlist")]
pub struct PlaylistCommand {
    /// Output file
    #[clap(short, long, default_value = "playlist.m3u8")]
    pub output: PathBuf,

    /// URL of the media playlist to wrap
    pub url: String,
}

impl PlaylistCommand {
    pub async fn write(self) -> anyhow::Result<()> {
        tokio::fs::write(&self.output, stream_wrapper(&self.url)).await?;
        tracing::info!("Playlist written to {}", self.output.display());
        Ok(())
    }
}
