use tokio::sync::mpsc;

use crate::{download::JobEvent, TrackKind};

/// Events reported to whoever presents the download.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Info(String),
    Progress {
        track: TrackKind,
        completed: usize,
        total: usize,
        bytes_downloaded: u64,
    },
    Error(String),
    Complete {
        total_size: usize,
    },
}

pub type EventSender = mpsc::UnboundedSender<DownloadEvent>;

/// Sends events if anyone listens. A dropped receiver is not an error.
#[derive(Clone, Default)]
pub(crate) struct EventSink(Option<EventSender>);

impl EventSink {
    pub(crate) fn new(sender: Option<EventSender>) -> Self {
        Self(sender)
    }

    fn send(&self, event: DownloadEvent) {
        if let Some(sender) = &self.0 {
            _ = sender.send(event);
        }
    }

    pub(crate) fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.send(DownloadEvent::Info(message));
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        self.send(DownloadEvent::Error(message.into()));
    }

    pub(crate) fn complete(&self, total_size: usize) {
        self.send(DownloadEvent::Complete { total_size });
    }

    /// Forward an event of the downloader working on `track`.
    pub(crate) fn job(&self, track: TrackKind, event: JobEvent) {
        match event {
            JobEvent::Progress(progress) => self.send(DownloadEvent::Progress {
                track,
                completed: progress.completed,
                total: progress.total,
                bytes_downloaded: progress.bytes_downloaded,
            }),
            JobEvent::SegmentSkipped { index, reason } => self.send(DownloadEvent::Info(format!(
                "Error on {track} segment {index}, continuing... {reason}"
            ))),
        }
    }
}
