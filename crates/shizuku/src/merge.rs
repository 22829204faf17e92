use std::path::Path;

use bytes::{Bytes, BytesMut};

use crate::{error::ShizukuResult, SegmentFormat, TrackKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub data: Bytes,
    pub total_size: usize,
}

/// Concatenate `buffers` in the order given.
pub fn combine<B>(buffers: &[B]) -> Combined
where
    B: AsRef<[u8]>,
{
    let total_size = buffers.iter().map(|b| b.as_ref().len()).sum();
    let mut data = BytesMut::with_capacity(total_size);
    for buffer in buffers {
        data.extend_from_slice(buffer.as_ref());
    }

    Combined {
        data: data.freeze(),
        total_size,
    }
}

/// One downloaded stream, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: TrackKind,
    pub format: SegmentFormat,
    pub data: Bytes,
    pub size: usize,
    /// Number of segments in the source playlist
    pub segments: usize,
    pub skipped: Vec<usize>,
}

impl Artifact {
    /// File extension matching the payload.
    ///
    /// Fragmented MP4 audio is saved as `m4a`.
    pub fn extension(&self) -> &str {
        match (&self.kind, &self.format) {
            (TrackKind::Audio, SegmentFormat::Mp4) => "m4a",
            (_, format) => format.as_ext(),
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> ShizukuResult<()> {
        let path = path.as_ref();
        tokio::fs::write(path, &self.data).await?;
        tracing::info!(
            "Saved {} stream ({} bytes) to {}",
            self.kind,
            self.size,
            path.display()
        );
        Ok(())
    }
}
