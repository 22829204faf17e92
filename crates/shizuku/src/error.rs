use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShizukuError {
    #[error("HTTP error: {0}")]
    HttpError(StatusCode),

    #[error(transparent)]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid m3u8 file: {0}")]
    ParseError(String),

    #[error("No playable streams found in variant playlist")]
    NoPlayableSource,

    #[error("No segments found in media playlist")]
    NoSegments,

    #[error("Failed to download segment {index}: {source}")]
    SegmentFailed {
        index: usize,
        #[source]
        source: Box<ShizukuError>,
    },

    #[error("Download cancelled")]
    Cancelled,

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
}

pub type ShizukuResult<T> = Result<T, ShizukuError>;

impl ShizukuError {
    /// Classify the error into the category shown to users.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SegmentFailed { source, .. } => source.category(),
            Self::HttpError(status) => ErrorCategory::from_status(*status),
            Self::NetworkError(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::NetworkError(e) => e
                .status()
                .map(ErrorCategory::from_status)
                .unwrap_or(ErrorCategory::Generic),
            Self::ParseError(_) | Self::NoPlayableSource | Self::NoSegments => {
                ErrorCategory::ExtractionFailed
            }
            _ => ErrorCategory::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Timeout,
    AccessForbidden,
    NotFound,
    ExtractionFailed,
    Generic,
}

impl ErrorCategory {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            StatusCode::FORBIDDEN => Self::AccessForbidden,
            StatusCode::NOT_FOUND | StatusCode::GONE => Self::NotFound,
            _ => Self::Generic,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Timeout => "Request Timeout",
            Self::AccessForbidden => "Access Forbidden",
            Self::NotFound => "Video Not Found",
            Self::ExtractionFailed => "Video Extraction Failed",
            Self::Generic => "Failed to Load Video",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Self::Timeout => "The server took too long to respond.",
            Self::AccessForbidden => {
                "The server refused access. The content provider may restrict this stream."
            }
            Self::NotFound => "The requested stream does not exist or has been removed.",
            Self::ExtractionFailed => {
                "Could not extract stream information from the playlist. The format may have changed."
            }
            Self::Generic => "An unexpected error occurred. Please try again later.",
        }
    }
}
