use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SegmentFormat {
    #[default]
    Mpeg2TS,
    Mp4,
    M4a,
    Aac,
    Other(String),
}

impl SegmentFormat {
    pub fn as_ext(&self) -> &str {
        match self {
            Self::Mpeg2TS => "ts",
            Self::Mp4 => "mp4",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Other(ext) => ext.as_str(),
        }
    }

    pub fn from_filename(s: &str) -> Self {
        let (_, ext) = s.rsplit_once('.').unwrap_or(("", s));
        match ext.to_ascii_lowercase().as_str() {
            "ts" => Self::Mpeg2TS,
            "mp4" | "m4s" | "m4f" | "m4v" => Self::Mp4,
            "m4a" => Self::M4a,
            "aac" => Self::Aac,
            _ => Self::Other(ext.to_string()),
        }
    }

    /// Guess the format from the last path component of a segment url.
    pub fn from_url(url: &str) -> Self {
        let path = url.find(['?', '#']).map_or(url, |end| &url[..end]);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if file_name.contains('.') {
            Self::from_filename(file_name)
        } else {
            Self::default()
        }
    }
}

/// Kind of stream a downloader works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TrackKind {
    #[default]
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}
