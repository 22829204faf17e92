use crate::{
    error::{ShizukuError, ShizukuResult},
    hls::{AudioTrack, StreamVariant, VariantManifest},
};

/// The highest bandwidth variant carrying audio, or the highest bandwidth one
/// if none does.
pub fn select_variant(manifest: &VariantManifest) -> ShizukuResult<&StreamVariant> {
    manifest
        .streams
        .iter()
        .find(|stream| stream.has_embedded_audio)
        .or_else(|| manifest.streams.first())
        .ok_or(ShizukuError::NoPlayableSource)
}

/// The audio track to download next to `variant`, if it needs one.
pub fn find_audio_track<'a>(
    manifest: &'a VariantManifest,
    variant: &StreamVariant,
) -> Option<&'a AudioTrack> {
    if variant.has_embedded_audio {
        return None;
    }
    let group_id = variant.audio_group_id.as_deref().filter(|id| !id.is_empty())?;
    prefer_default(
        manifest
            .audio_tracks
            .iter()
            .filter(|track| track.group_id == group_id),
    )
}

pub fn select_audio_only(manifest: &VariantManifest) -> Option<&AudioTrack> {
    prefer_default(manifest.audio_tracks.iter())
}

fn prefer_default<'a, I>(mut tracks: I) -> Option<&'a AudioTrack>
where
    I: Iterator<Item = &'a AudioTrack> + Clone,
{
    tracks
        .clone()
        .find(|track| track.is_default)
        .or_else(|| tracks.next())
}
