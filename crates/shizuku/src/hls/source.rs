use super::playlist::{parse, Playlist};
use crate::{error::ShizukuResult, Fetcher};

/// Fetch and parse the playlist at `url`, trying at most `total_retry` times.
pub async fn load_playlist<F>(fetcher: &F, url: &str, total_retry: u32) -> ShizukuResult<Playlist>
where
    F: Fetcher,
{
    tracing::info!("Start fetching M3U8 file. {url}");

    let mut retry = total_retry.max(1);
    let text = loop {
        match fetcher.fetch_manifest(url).await {
            Ok(text) => break text,
            Err(error) => {
                retry -= 1;
                if retry == 0 {
                    tracing::error!("Failed to fetch M3U8 file: {error}");
                    return Err(error);
                }
                tracing::warn!("Failed to fetch M3U8 file, retry later: {error}");
            }
        }
    };
    tracing::info!("M3U8 file fetched.");

    let playlist = parse(&text, url)?;
    match &playlist {
        Playlist::Variant(manifest) => tracing::debug!(
            "Variant playlist with {} streams and {} audio tracks.",
            manifest.streams.len(),
            manifest.audio_tracks.len()
        ),
        Playlist::Segment(manifest) => {
            tracing::debug!("Media playlist with {} segments.", manifest.segments.len())
        }
    }
    Ok(playlist)
}
