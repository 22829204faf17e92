use std::collections::BTreeMap;

use super::{
    attributes::{parse_attribute_list, scan_attribute_list, Attributes},
    url::resolve,
};
use crate::error::ShizukuResult;

const STREAM_INF: &str = "#EXT-X-STREAM-INF";
const MEDIA: &str = "#EXT-X-MEDIA:";
const EXTINF: &str = "#EXTINF:";

const AUDIO_CODECS: [&str; 6] = ["mp4a", "aac", "ac-3", "ec-3", "opus", "flac"];
const VIDEO_CODECS: [&str; 7] = ["avc1", "avc3", "hvc1", "hev1", "dvh1", "av01", "vp09"];

#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Variant(VariantManifest),
    Segment(SegmentManifest),
}

/// A playlist listing alternative encodings of the same content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantManifest {
    /// Sorted by descending bandwidth. Variants with the same bandwidth keep
    /// the order they were declared in.
    pub streams: Vec<StreamVariant>,
    pub audio_tracks: Vec<AudioTrack>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamVariant {
    /// Absolute url of the segment playlist of this variant
    pub url: String,
    pub bandwidth: Option<u64>,
    pub resolution: Option<String>,
    pub frame_rate: Option<f64>,
    pub codecs: Option<String>,
    pub audio_group_id: Option<String>,
    pub has_embedded_audio: bool,
}

impl StreamVariant {
    fn from_attributes(attributes: &Attributes) -> Self {
        let codecs = attributes.get("CODECS").cloned();
        Self {
            url: String::new(),
            bandwidth: attributes.get("BANDWIDTH").and_then(|b| b.parse().ok()),
            resolution: attributes.get("RESOLUTION").cloned(),
            frame_rate: attributes.get("FRAME-RATE").and_then(|f| f.parse().ok()),
            has_embedded_audio: has_audio_codec(codecs.as_deref()),
            codecs,
            audio_group_id: attributes.get("AUDIO").cloned(),
        }
    }

    /// Short quality label, e.g. `1080p`, `1080p 60fps` or `Unknown`.
    pub fn label(&self) -> String {
        let Some(resolution) = &self.resolution else {
            return "Unknown".to_string();
        };
        let height = resolution
            .split_once('x')
            .and_then(|(_, height)| height.parse::<u32>().ok());
        match (height, self.frame_rate) {
            (Some(height), Some(fps)) if fps >= 50. => format!("{height}p {}fps", fps.round()),
            (Some(height), _) => format!("{height}p"),
            (None, _) => resolution.clone(),
        }
    }
}

/// Whether a `CODECS` attribute describes a stream carrying audio.
///
/// A stream without codec information, or with only unknown codecs, is
/// assumed to carry audio.
fn has_audio_codec(codecs: Option<&str>) -> bool {
    let Some(codecs) = codecs else {
        return true;
    };
    let codecs = codecs.to_ascii_lowercase();
    if AUDIO_CODECS.iter().any(|codec| codecs.contains(codec)) {
        return true;
    }
    !VIDEO_CODECS.iter().any(|codec| codecs.contains(codec))
}

/// An audio-only rendition declared with `#EXT-X-MEDIA:TYPE=AUDIO`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioTrack {
    pub url: String,
    /// Links the track to [StreamVariant::audio_group_id]
    pub group_id: String,
    pub name: String,
    pub language: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentManifest {
    pub segments: Vec<Segment>,
    /// Absolute url of the initialization section declared by `#EXT-X-MAP`
    pub init_url: Option<String>,
    /// Playlist level `#EXT-X-*` tags, keyed by the tag name without prefix
    pub attributes: BTreeMap<String, String>,
    pub ended: bool,
}

impl SegmentManifest {
    pub fn target_duration(&self) -> Option<f64> {
        self.attributes
            .get("TARGETDURATION")
            .and_then(|d| d.trim().parse().ok())
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// A playlist without `#EXT-X-ENDLIST` may still grow.
    pub fn is_endless(&self) -> bool {
        !self.ended
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    /// Position in the playlist, starting from 0. Output order follows it.
    pub index: usize,
    pub duration: f64,
    pub url: String,
}

/// Parse playlist text fetched from `manifest_url`.
///
/// Text containing `#EXT-X-STREAM-INF` is a variant manifest, anything else
/// (including empty text) is a segment manifest.
pub fn parse(text: &str, manifest_url: &str) -> ShizukuResult<Playlist> {
    if text.contains(STREAM_INF) {
        parse_variant_manifest(text, manifest_url).map(Playlist::Variant)
    } else {
        parse_segment_manifest(text, manifest_url).map(Playlist::Segment)
    }
}

fn parse_variant_manifest(text: &str, manifest_url: &str) -> ShizukuResult<VariantManifest> {
    let mut streams = Vec::new();
    let mut audio_tracks = Vec::new();
    let mut pending: Option<StreamVariant> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(attributes) = line.strip_prefix(STREAM_INF) {
            let attributes = attributes.strip_prefix(':').unwrap_or(attributes);
            pending = Some(StreamVariant::from_attributes(&parse_attribute_list(
                attributes,
            )));
        } else if let Some(attributes) = line.strip_prefix(MEDIA) {
            let attributes = scan_attribute_list(attributes);
            if attributes.get("TYPE").map(String::as_str) != Some("AUDIO") {
                continue;
            }
            // renditions without URI are muxed into the variant streams
            let Some(uri) = attributes.get("URI") else {
                continue;
            };
            audio_tracks.push(AudioTrack {
                url: resolve(uri, manifest_url)?,
                group_id: attributes.get("GROUP-ID").cloned().unwrap_or_default(),
                name: attributes
                    .get("NAME")
                    .cloned()
                    .unwrap_or_else(|| "Audio Track".to_string()),
                language: attributes
                    .get("LANGUAGE")
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                is_default: attributes.get("DEFAULT").map(String::as_str) == Some("YES"),
            });
        } else if !line.is_empty() && !line.starts_with('#') {
            if let Some(mut stream) = pending.take() {
                stream.url = resolve(line, manifest_url)?;
                streams.push(stream);
            }
        }
    }

    // stable, so equal bandwidths keep manifest order
    streams.sort_by(|a, b| b.bandwidth.unwrap_or(0).cmp(&a.bandwidth.unwrap_or(0)));

    Ok(VariantManifest {
        streams,
        audio_tracks,
    })
}

fn parse_segment_manifest(text: &str, manifest_url: &str) -> ShizukuResult<SegmentManifest> {
    let mut manifest = SegmentManifest::default();
    let mut pending_duration: Option<f64> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(tag) = line.strip_prefix("#EXT-X-") {
            match tag.split_once(':') {
                Some(("MAP", value)) => {
                    if let Some(uri) = scan_attribute_list(value).get("URI") {
                        manifest.init_url = Some(resolve(uri, manifest_url)?);
                    }
                    manifest.attributes.insert("MAP".to_string(), value.to_string());
                }
                Some((key, value)) => {
                    manifest.attributes.insert(key.to_string(), value.to_string());
                }
                None if tag == "ENDLIST" => manifest.ended = true,
                None => {}
            }
        } else if let Some(info) = line.strip_prefix(EXTINF) {
            let duration = info.split(',').next().unwrap_or_default().trim();
            pending_duration = Some(duration.parse().unwrap_or(0.));
        } else if !line.is_empty() && !line.starts_with('#') {
            if let Some(duration) = pending_duration.take() {
                manifest.segments.push(Segment {
                    index: manifest.segments.len(),
                    duration,
                    url: resolve(line, manifest_url)?,
                });
            }
        }
    }

    if pending_duration.is_some() {
        tracing::debug!("Dropped a trailing #EXTINF without segment uri.");
    }

    Ok(manifest)
}

/// A single variant playlist pointing at `url`, for players that only accept
/// local files.
pub fn stream_wrapper(url: &str) -> String {
    format!("#EXTM3U\n{STREAM_INF}:PROGRAM-ID=1\n{url}\n")
}
