pub mod config;
pub mod download;
pub mod error;
pub mod event;
pub mod fetch;
pub mod hls;
pub mod merge;
pub mod segment;
pub mod track;
pub mod util;

pub use config::*;
pub use error::*;
pub use segment::*;
pub use util::http::HttpClient;

/// ┌──────────────────┐                   ┌──────────────────────┐
/// │                  │   Variant #1      │                      │
/// │  Variant         ├───────────────────►  Video Downloader    ├───┐
/// │  Manifest        │                   │   [N in flight]      │   │fetch_segment
/// │                  │                   │                      ◄───┘
/// │                  │                   └──────────┬───────────┘
/// │                  │                              │ progress >= 50%
/// │                  │   Audio Track     ┌──────────▼───────────┐
/// │                  ├───────────────────►  Audio Downloader    ├───┐
/// │                  │                   │   [N in flight]      │   │fetch_segment
/// └──────────────────┘                   │                      ◄───┘
///                                        └──────────────────────┘
///
/// Everything that talks to the network goes through this trait, so the
/// downloaders can be driven by an HTTP client or by an in-memory source.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch the raw bytes of a single segment.
    ///
    /// A non-successful status is reported as [ShizukuError::HttpError], a
    /// transport failure as [ShizukuError::NetworkError]. Implementations must
    /// not retry.
    fn fetch_segment(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<bytes::Bytes>> + Send;

    /// Fetch the text of a playlist.
    fn fetch_manifest(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<String>> + Send {
        async move {
            let bytes = self.fetch_segment(url).await?;
            decode_manifest(url, bytes)
        }
    }
}

/// Playlist text must be UTF-8, anything else is rejected rather than repaired.
pub(crate) fn decode_manifest(url: &str, bytes: bytes::Bytes) -> ShizukuResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ShizukuError::ParseError(format!("{url} is not valid UTF-8")))
}

impl<F> Fetcher for std::sync::Arc<F>
where
    F: Fetcher,
{
    fn fetch_segment(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<bytes::Bytes>> + Send {
        self.as_ref().fetch_segment(url)
    }

    fn fetch_manifest(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = ShizukuResult<String>> + Send {
        self.as_ref().fetch_manifest(url)
    }
}
