use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Deserializer};

use crate::{download::FailurePolicy, track::TrackSelection};

/// Settings of one download, fixed once the download starts.
///
/// Can be deserialized from a config file, where `manifest_timeout` is given
/// in seconds and missing keys take their default values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    concurrency: NonZeroUsize,
    segment_retries: u32,
    manifest_retries: u32,
    #[serde(deserialize_with = "deserialize_seconds")]
    manifest_timeout: Duration,
    audio_start_ratio: f64,
    audio_failure_policy: FailurePolicy,
    selection: TrackSelection,
}

pub(crate) const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(2);

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            segment_retries: 0,
            manifest_retries: 3,
            manifest_timeout: Duration::from_secs(60),
            audio_start_ratio: 0.5,
            audio_failure_policy: FailurePolicy::Skip,
            selection: TrackSelection::Auto,
        }
    }
}

impl DownloadConfig {
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::default()
    }

    /// Maximum segments in flight for each downloader.
    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    pub fn segment_retries(&self) -> u32 {
        self.segment_retries
    }

    pub fn manifest_retries(&self) -> u32 {
        self.manifest_retries
    }

    pub fn manifest_timeout(&self) -> Duration {
        self.manifest_timeout
    }

    /// Share of video segments to finish before the audio download starts.
    pub fn audio_start_ratio(&self) -> f64 {
        self.audio_start_ratio.clamp(0., 1.)
    }

    pub fn audio_failure_policy(&self) -> FailurePolicy {
        self.audio_failure_policy
    }

    pub fn selection(&self) -> TrackSelection {
        self.selection
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl From<DownloadConfig> for DownloadConfigBuilder {
    fn from(config: DownloadConfig) -> Self {
        Self { config }
    }
}

impl DownloadConfigBuilder {
    pub fn concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn segment_retries(mut self, retries: u32) -> Self {
        self.config.segment_retries = retries;
        self
    }

    pub fn manifest_retries(mut self, retries: u32) -> Self {
        self.config.manifest_retries = retries;
        self
    }

    pub fn manifest_timeout(mut self, timeout: Duration) -> Self {
        self.config.manifest_timeout = timeout;
        self
    }

    pub fn audio_start_ratio(mut self, ratio: f64) -> Self {
        self.config.audio_start_ratio = ratio.clamp(0., 1.);
        self
    }

    pub fn audio_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.audio_failure_policy = policy;
        self
    }

    pub fn selection(mut self, selection: TrackSelection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn build(self) -> DownloadConfig {
        self.config
    }
}
