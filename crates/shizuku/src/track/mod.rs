mod orchestrator;
mod select;

pub use orchestrator::{DownloadOutput, TrackOrchestrator};
pub use select::{find_audio_track, select_audio_only, select_variant};

use serde::Deserialize;

/// Which streams of a variant playlist to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackSelection {
    /// Best variant with audio, plus a separate audio track when it has none.
    #[default]
    Auto,
    /// Only the declared audio track.
    AudioOnly,
}
