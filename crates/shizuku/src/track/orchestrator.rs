use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

use super::{find_audio_track, select_audio_only, select_variant, TrackSelection};
use crate::{
    config::DownloadConfig,
    download::{
        fetch_with_retry, CompletedJob, FailurePolicy, JobEvent, ParallelDownloader,
        ParallelDownloaderBuilder,
    },
    error::{ShizukuError, ShizukuResult},
    event::{EventSender, EventSink},
    hls::{load_playlist, Playlist, Segment, SegmentManifest},
    merge::{combine, Artifact},
    Fetcher, SegmentFormat, TrackKind,
};

/// Streams produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutput {
    pub primary: Artifact,
    /// Present only when a separate audio track was downloaded successfully.
    pub audio: Option<Artifact>,
}

impl DownloadOutput {
    pub fn total_size(&self) -> usize {
        self.primary.size + self.audio.as_ref().map_or(0, |audio| audio.size)
    }
}

struct Stream {
    kind: TrackKind,
    manifest: SegmentManifest,
}

enum Plan {
    Single(Stream),
    Dual { video: Stream, audio: Stream },
}

/// Picks the streams of a playlist and drives their downloaders.
///
/// The video stream is primary, so any failure on it ends the run. A separate
/// audio track only starts once the video reached
/// [DownloadConfig::audio_start_ratio], and its failures leave a video-only
/// output.
pub struct TrackOrchestrator<F> {
    fetcher: Arc<F>,
    config: DownloadConfig,
    cancel: CancellationToken,
}

impl<F> TrackOrchestrator<F>
where
    F: Fetcher,
{
    pub fn new(fetcher: F, config: DownloadConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token stopping every downloader of this orchestrator.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download the playlist at `url`, reporting to `events` if given.
    ///
    /// Ends with [DownloadEvent::Complete](crate::event::DownloadEvent::Complete)
    /// on success and [DownloadEvent::Error](crate::event::DownloadEvent::Error)
    /// otherwise.
    pub async fn run(
        &self,
        url: &str,
        events: Option<EventSender>,
    ) -> ShizukuResult<DownloadOutput> {
        let sink = EventSink::new(events);
        match self.run_with(url, &sink).await {
            Ok(output) => {
                sink.complete(output.total_size());
                Ok(output)
            }
            Err(error) => {
                tracing::error!("Download failed: {error}");
                sink.error(error.to_string());
                Err(error)
            }
        }
    }

    async fn run_with(&self, url: &str, sink: &EventSink) -> ShizukuResult<DownloadOutput> {
        match self.plan(url, sink).await? {
            Plan::Single(stream) => {
                let primary = self.download_single(stream, sink).await?;
                Ok(DownloadOutput {
                    primary,
                    audio: None,
                })
            }
            Plan::Dual { video, audio } => {
                let (primary, audio) = self.download_dual(video, audio, sink).await?;
                if audio.is_some() {
                    sink.info(
                        "Video and audio were saved as separate files, mux them with an external tool for combined playback.",
                    );
                }
                Ok(DownloadOutput { primary, audio })
            }
        }
    }

    async fn plan(&self, url: &str, sink: &EventSink) -> ShizukuResult<Plan> {
        let playlist =
            load_playlist(self.fetcher.as_ref(), url, self.config.manifest_retries()).await?;

        let manifest = match playlist {
            Playlist::Segment(manifest) => {
                let kind = match self.config.selection() {
                    TrackSelection::Auto => TrackKind::Video,
                    TrackSelection::AudioOnly => TrackKind::Audio,
                };
                if manifest.segments.is_empty() {
                    return Err(ShizukuError::NoSegments);
                }
                return Ok(Plan::Single(Stream { kind, manifest }));
            }
            Playlist::Variant(manifest) => manifest,
        };

        if self.config.selection() == TrackSelection::AudioOnly {
            let track = select_audio_only(&manifest).ok_or(ShizukuError::NoPlayableSource)?;
            sink.info(format!("Selected audio track: {}", track.name));
            let manifest = self.load_segments(&track.url).await?;
            return Ok(Plan::Single(Stream {
                kind: TrackKind::Audio,
                manifest,
            }));
        }

        let variant = select_variant(&manifest)?;
        sink.info(format!("Selected quality: {}", variant.label()));
        let video = Stream {
            kind: TrackKind::Video,
            manifest: self.load_segments(&variant.url).await?,
        };

        if variant.has_embedded_audio || variant.audio_group_id.is_none() {
            return Ok(Plan::Single(video));
        }

        sink.info("Video has no embedded audio, checking for separate audio stream...");
        let Some(track) = find_audio_track(&manifest, variant) else {
            sink.info("No matching audio stream found, continuing with video only");
            return Ok(Plan::Single(video));
        };
        sink.info(format!("Found matching audio stream: {}", track.name));

        match self.load_segments(&track.url).await {
            Ok(manifest) => Ok(Plan::Dual {
                video,
                audio: Stream {
                    kind: TrackKind::Audio,
                    manifest,
                },
            }),
            Err(error) => {
                tracing::warn!("Failed to load audio playlist: {error}");
                sink.info(format!(
                    "Audio stream failed, continuing with video only: {error}"
                ));
                Ok(Plan::Single(video))
            }
        }
    }

    /// Load a playlist that must list segments.
    async fn load_segments(&self, url: &str) -> ShizukuResult<SegmentManifest> {
        match load_playlist(self.fetcher.as_ref(), url, self.config.manifest_retries()).await? {
            Playlist::Segment(manifest) if manifest.segments.is_empty() => {
                Err(ShizukuError::NoSegments)
            }
            Playlist::Segment(manifest) => Ok(manifest),
            Playlist::Variant(_) => Err(ShizukuError::ParseError(format!(
                "expected a media playlist at {url}"
            ))),
        }
    }

    fn downloader(
        &self,
        policy: FailurePolicy,
        cancel: CancellationToken,
    ) -> ParallelDownloader<F> {
        ParallelDownloaderBuilder::new()
            .concurrency(self.config.concurrency())
            .retries(self.config.segment_retries())
            .policy(policy)
            .cancellation(cancel)
            .build(self.fetcher.clone())
    }

    async fn fetch_init(&self, manifest: &SegmentManifest) -> ShizukuResult<Option<Bytes>> {
        let Some(url) = &manifest.init_url else {
            return Ok(None);
        };
        tracing::debug!("Fetching initialization section {url}");
        let init = Segment {
            index: 0,
            duration: 0.,
            url: url.clone(),
        };
        fetch_with_retry(self.fetcher.as_ref(), &init, self.config.segment_retries())
            .await
            .map(Some)
    }

    async fn download_single(&self, stream: Stream, sink: &EventSink) -> ShizukuResult<Artifact> {
        let init = self.fetch_init(&stream.manifest).await?;

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handle = self
            .downloader(FailurePolicy::FailFast, self.cancel.clone())
            .spawn(stream.manifest.segments.clone(), Some(sender));
        while let Some(event) = receiver.recv().await {
            sink.job(stream.kind, event);
        }

        let job = join(handle).await?;
        Ok(artifact(&stream, init, job))
    }

    async fn download_dual(
        &self,
        video: Stream,
        audio: Stream,
        sink: &EventSink,
    ) -> ShizukuResult<(Artifact, Option<Artifact>)> {
        let video_init = self.fetch_init(&video.manifest).await?;

        let (sender, mut video_events) = mpsc::unbounded_channel();
        let mut video_handle = self
            .downloader(FailurePolicy::FailFast, self.cancel.clone())
            .spawn(video.manifest.segments.clone(), Some(sender));

        // hold the audio back until the video is far enough
        let threshold = self.config.audio_start_ratio();
        let mut video_job = None;
        if threshold > 0. {
            loop {
                let Some(event) = video_events.recv().await else {
                    // finished before the threshold
                    video_job = Some(join(&mut video_handle).await?);
                    break;
                };
                let reached = matches!(&event, JobEvent::Progress(p) if p.ratio() >= threshold);
                sink.job(TrackKind::Video, event);
                if reached {
                    break;
                }
            }
        }

        sink.info("Starting audio download...");
        let audio_cancel = self.cancel.child_token();
        let (audio_init, mut audio_events, mut audio_handle) =
            match self.fetch_init(&audio.manifest).await {
                Ok(init) => {
                    let (sender, receiver) = mpsc::unbounded_channel();
                    let handle = self
                        .downloader(self.config.audio_failure_policy(), audio_cancel.clone())
                        .spawn(audio.manifest.segments.clone(), Some(sender));
                    (init, receiver, Some(handle))
                }
                Err(error) => {
                    sink.info(format!(
                        "Audio stream failed, continuing with video only: {error}"
                    ));
                    (None, closed_channel(), None)
                }
            };

        let mut video_done = video_job.is_some();
        let mut audio_done = false;
        while !(video_done && audio_done) {
            tokio::select! {
                event = video_events.recv(), if !video_done => match event {
                    Some(event) => sink.job(TrackKind::Video, event),
                    None => {
                        video_done = true;
                        match join(&mut video_handle).await {
                            Ok(job) => video_job = Some(job),
                            Err(error) => {
                                audio_cancel.cancel();
                                return Err(error);
                            }
                        }
                    }
                },
                event = audio_events.recv(), if !audio_done => match event {
                    Some(event) => sink.job(TrackKind::Audio, event),
                    None => audio_done = true,
                },
            }
        }

        let Some(video_job) = video_job else {
            return Err(ShizukuError::Cancelled);
        };
        let primary = artifact(&video, video_init, video_job);

        let audio_artifact = match audio_handle.take() {
            Some(handle) => match join(handle).await {
                Ok(job) => Some(artifact(&audio, audio_init, job)),
                Err(error) => {
                    tracing::warn!("Audio download failed: {error}");
                    sink.info(format!(
                        "Audio stream failed, continuing with video only: {error}"
                    ));
                    None
                }
            },
            None => None,
        };

        Ok((primary, audio_artifact))
    }
}

async fn join<H>(handle: H) -> ShizukuResult<CompletedJob>
where
    H: std::future::Future<Output = Result<ShizukuResult<CompletedJob>, tokio::task::JoinError>>,
{
    handle.await?
}

fn closed_channel() -> UnboundedReceiver<JobEvent> {
    let (_, receiver) = mpsc::unbounded_channel();
    receiver
}

fn artifact(stream: &Stream, init: Option<Bytes>, job: CompletedJob) -> Artifact {
    let format = stream
        .manifest
        .segments
        .first()
        .map(|segment| SegmentFormat::from_url(&segment.url))
        .unwrap_or_default();

    let mut buffers = Vec::with_capacity(job.buffers.len() + 1);
    buffers.extend(init);
    buffers.extend(job.buffers);
    let combined = combine(&buffers);

    Artifact {
        kind: stream.kind,
        format,
        data: combined.data,
        size: combined.total_size,
        segments: stream.manifest.segments.len(),
        skipped: job.skipped,
    }
}
