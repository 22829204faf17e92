use std::{num::NonZeroUsize, sync::Arc};

use bytes::Bytes;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

use super::{job::DownloadJob, CompletedJob, FailurePolicy, JobEvent};
use crate::{
    config::DEFAULT_CONCURRENCY,
    error::{ShizukuError, ShizukuResult},
    hls::Segment,
    Fetcher,
};

/// Downloads a list of segments with at most `concurrency` fetches in flight.
pub struct ParallelDownloader<F> {
    fetcher: Arc<F>,
    concurrency: NonZeroUsize,
    retries: u32,
    policy: FailurePolicy,
    cancel: CancellationToken,
}

impl<F> ParallelDownloader<F>
where
    F: Fetcher,
{
    /// Run the job on its own task.
    pub fn spawn(
        self,
        segments: Vec<Segment>,
        events: Option<UnboundedSender<JobEvent>>,
    ) -> JoinHandle<ShizukuResult<CompletedJob>> {
        tokio::spawn(self.download(segments, events))
    }

    pub async fn download(
        self,
        mut segments: Vec<Segment>,
        events: Option<UnboundedSender<JobEvent>>,
    ) -> ShizukuResult<CompletedJob> {
        let limit = self.concurrency.get();
        tracing::info!(
            "Start downloading {} segments with {limit} thread(s).",
            segments.len()
        );

        segments.sort_by_key(|segment| segment.index);
        let total = segments.len();
        let mut job = DownloadJob::new(total);
        let mut tasks = JoinSet::new();
        let mut cursor = 0;
        let mut last_error = None;

        let send = |event: JobEvent| {
            if let Some(events) = &events {
                _ = events.send(event);
            }
        };

        loop {
            while tasks.len() < limit
                && cursor < total
                && !job.is_failed()
                && !self.cancel.is_cancelled()
            {
                let slot = cursor;
                let segment = segments[slot].clone();
                let fetcher = self.fetcher.clone();
                let retries = self.retries;
                tracing::debug!("Start processing segment {}.", segment.index);
                tasks.spawn(async move {
                    let result = fetch_with_retry(fetcher.as_ref(), &segment, retries).await;
                    (slot, segment.index, result)
                });
                cursor += 1;
            }

            if tasks.is_empty() {
                break;
            }

            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                // in-flight fetches keep running, their results are dropped
                tracing::info!("Download cancelled, stop scheduling new segments.");
                tasks.detach_all();
                return Err(ShizukuError::Cancelled);
            };

            let (slot, index, result) = joined?;
            match result {
                Ok(data) => {
                    let progress = job.store(slot, data);
                    let done = progress.completed;
                    let percentage = progress.ratio() * 100.;
                    tracing::info!(
                        "Processing segment {index} finished. ({done} / {total} or {percentage:.2}%)"
                    );
                    send(JobEvent::Progress(progress));
                }
                Err(error) => match self.policy {
                    FailurePolicy::FailFast => {
                        tracing::error!("Processing segment {index} failed, stop downloading. {error}");
                        job.fail();
                        tasks.detach_all();
                        return Err(ShizukuError::SegmentFailed {
                            index,
                            source: Box::new(error),
                        });
                    }
                    FailurePolicy::Skip => {
                        tracing::warn!("Processing segment {index} failed, skipped. {error}");
                        job.skip(index);
                        send(JobEvent::SegmentSkipped {
                            index,
                            reason: error.to_string(),
                        });
                        last_error = Some((index, error));
                    }
                },
            }
        }

        if !job.is_settled() {
            return Err(ShizukuError::Cancelled);
        }
        if total > 0 && job.completed() == 0 {
            if let Some((index, error)) = last_error {
                tracing::error!("All {total} segments failed.");
                return Err(ShizukuError::SegmentFailed {
                    index,
                    source: Box::new(error),
                });
            }
        }

        let completed = job.into_completed();
        if !completed.skipped.is_empty() {
            tracing::warn!("Failed to download {} segments:", completed.skipped.len());
            for index in completed.skipped.iter() {
                tracing::warn!("  - segment {index}");
            }
        }
        Ok(completed)
    }
}

/// Fetch one segment, trying again up to `retries` times.
pub(crate) async fn fetch_with_retry<F>(
    fetcher: &F,
    segment: &Segment,
    mut retries: u32,
) -> ShizukuResult<Bytes>
where
    F: Fetcher,
{
    loop {
        match fetcher.fetch_segment(&segment.url).await {
            Ok(data) => return Ok(data),
            Err(error) if retries > 0 => {
                retries -= 1;
                tracing::warn!(
                    "Processing segment {} failed, retry later. {error}",
                    segment.index
                );
            }
            Err(error) => return Err(error),
        }
    }
}

pub struct ParallelDownloaderBuilder {
    concurrency: NonZeroUsize,
    retries: u32,
    policy: FailurePolicy,
    cancel: Option<CancellationToken>,
}

impl ParallelDownloaderBuilder {
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retries: 0,
            policy: FailurePolicy::FailFast,
            cancel: None,
        }
    }

    pub fn concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build<F>(self, fetcher: Arc<F>) -> ParallelDownloader<F>
    where
        F: Fetcher,
    {
        ParallelDownloader {
            fetcher,
            concurrency: self.concurrency,
            retries: self.retries,
            policy: self.policy,
            cancel: self.cancel.unwrap_or_default(),
        }
    }

    pub async fn download<F>(
        self,
        fetcher: Arc<F>,
        segments: Vec<Segment>,
    ) -> ShizukuResult<CompletedJob>
    where
        F: Fetcher,
    {
        self.build(fetcher).download(segments, None).await
    }
}

impl Default for ParallelDownloaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
