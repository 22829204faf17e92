use std::time::Duration;

use clap::Parser;
use shizuku::{
    fetch::HttpFetcher,
    hls::{load_playlist, Playlist, SegmentManifest, VariantManifest},
    track::select_variant,
    util::fmt::format_bitrate,
    DownloadConfig,
};

use super::download::HttpOptions;

#[derive(Parser, Clone)]
#[clap(name = "inspect", short_flag = 'S')]
pub struct InspectCommand {
    #[clap(flatten)]
    pub http: HttpOptions,

    /// Manifest retry limit
    #[clap(long, default_value_t = 3)]
    pub manifest_retries: u32,

    /// Manifest request timeout, in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// URL of the playlist to inspect
    pub url: String,
}

impl InspectCommand {
    pub async fn inspect(self) -> anyhow::Result<()> {
        let fetcher = self.fetcher()?;

        match load_playlist(&fetcher, &self.url, self.manifest_retries).await? {
            Playlist::Variant(manifest) => print_variants(&manifest),
            Playlist::Segment(manifest) => print_segments(&manifest),
        }
        Ok(())
    }

    fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| DownloadConfig::default().manifest_timeout());
        let client = self.http.clone().into_client(&self.url)?;
        Ok(HttpFetcher::new(client).with_manifest_timeout(timeout))
    }
}

fn print_variants(manifest: &VariantManifest) {
    println!("Variants:");
    for (index, stream) in manifest.streams.iter().enumerate() {
        println!(
            "  [{index}] {} {} codecs={} audio-group={} embedded-audio={}",
            stream.label(),
            stream
                .bandwidth
                .map(format_bitrate)
                .unwrap_or_else(|| "-".to_string()),
            stream.codecs.as_deref().unwrap_or("-"),
            stream.audio_group_id.as_deref().unwrap_or("-"),
            stream.has_embedded_audio,
        );
        println!("      {}", stream.url);
    }

    if !manifest.audio_tracks.is_empty() {
        println!("Audio tracks:");
        for track in &manifest.audio_tracks {
            let default = if track.is_default { " (default)" } else { "" };
            println!(
                "  {} [{}] group={}{default}",
                track.name, track.language, track.group_id
            );
            println!("      {}", track.url);
        }
    }

    if let Ok(variant) = select_variant(manifest) {
        println!("Selected: {} {}", variant.label(), variant.url);
    }
}

fn print_segments(manifest: &SegmentManifest) {
    println!("Segments: {}", manifest.segments.len());
    println!("Duration: {:.2}s", manifest.total_duration());
    if let Some(target) = manifest.target_duration() {
        println!("Target duration: {target}s");
    }
    if let Some(init) = &manifest.init_url {
        println!("Initialization section: {init}");
    }
    if manifest.is_endless() {
        println!("Live: the playlist has no end marker and may still grow");
    }
}
