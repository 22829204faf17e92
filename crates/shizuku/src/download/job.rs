use bytes::Bytes;

use super::{CompletedJob, JobProgress};

/// Bookkeeping of one downloader run, owned by the scheduling loop.
///
/// Slots are pre-sized, so the position a payload ends up at never depends on
/// when its fetch finished.
#[derive(Debug)]
pub(crate) struct DownloadJob {
    total: usize,
    completed: usize,
    bytes_downloaded: u64,
    buffers: Vec<Option<Bytes>>,
    skipped: Vec<usize>,
    failed: bool,
}

impl DownloadJob {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            bytes_downloaded: 0,
            buffers: vec![None; total],
            skipped: Vec::new(),
            failed: false,
        }
    }

    pub(crate) fn store(&mut self, slot: usize, data: Bytes) -> JobProgress {
        self.bytes_downloaded += data.len() as u64;
        if self.buffers[slot].replace(data).is_none() {
            self.completed += 1;
        }
        self.progress()
    }

    pub(crate) fn skip(&mut self, index: usize) {
        self.skipped.push(index);
    }

    pub(crate) fn fail(&mut self) {
        self.failed = true;
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.failed
    }

    /// Every segment either completed or was skipped.
    pub(crate) fn is_settled(&self) -> bool {
        self.completed + self.skipped.len() == self.total
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed
    }

    pub(crate) fn progress(&self) -> JobProgress {
        JobProgress {
            completed: self.completed,
            total: self.total,
            bytes_downloaded: self.bytes_downloaded,
        }
    }

    pub(crate) fn into_completed(mut self) -> CompletedJob {
        self.skipped.sort_unstable();
        CompletedJob {
            buffers: self.buffers.into_iter().flatten().collect(),
            skipped: self.skipped,
            bytes_downloaded: self.bytes_downloaded,
        }
    }
}
