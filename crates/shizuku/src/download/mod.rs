mod job;
mod parallel;

pub(crate) use parallel::fetch_with_retry;
pub use parallel::{ParallelDownloader, ParallelDownloaderBuilder};

use bytes::Bytes;
use serde::Deserialize;

/// What a downloader does when a segment still fails after its retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop scheduling and fail the whole job.
    #[default]
    FailFast,
    /// Leave the slot empty and keep going.
    Skip,
}

/// Reported by a downloader while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(JobProgress),
    SegmentSkipped { index: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    pub completed: usize,
    pub total: usize,
    pub bytes_downloaded: u64,
}

impl JobProgress {
    /// Share of segments completed, `1.0` for an empty job.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Result of a job that was not failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedJob {
    /// Segment payloads in index order. Skipped segments are absent.
    pub buffers: Vec<Bytes>,
    /// Indices of segments dropped under [FailurePolicy::Skip]
    pub skipped: Vec<usize>,
    pub bytes_downloaded: u64,
}

impl CompletedJob {
    pub fn segment_count(&self) -> usize {
        self.buffers.len() + self.skipped.len()
    }
}
