use shizuku::hls::{parse, resolve, Playlist, Segment, SegmentManifest, VariantManifest};

fn variant_manifest(text: &str, url: &str) -> anyhow::Result<VariantManifest> {
    match parse(text, url)? {
        Playlist::Variant(manifest) => Ok(manifest),
        Playlist::Segment(_) => anyhow::bail!("expected a variant manifest"),
    }
}

fn segment_manifest(text: &str, url: &str) -> anyhow::Result<SegmentManifest> {
    match parse(text, url)? {
        Playlist::Segment(manifest) => Ok(manifest),
        Playlist::Variant(_) => anyhow::bail!("expected a segment manifest"),
    }
}

#[test]
fn variants_sorted_by_bandwidth() -> anyhow::Result<()> {
    let text = "#EXT-X-STREAM-INF:BANDWIDTH=500000\nlow.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=2000000\nhigh.m3u8";
    let manifest = variant_manifest(text, "https://cdn.example/master.m3u8")?;

    assert_eq!(manifest.streams.len(), 2);
    assert_eq!(manifest.streams[0].url, "https://cdn.example/high.m3u8");
    assert_eq!(manifest.streams[0].bandwidth, Some(2000000));
    assert_eq!(manifest.streams[1].url, "https://cdn.example/low.m3u8");
    assert_eq!(manifest.streams[1].bandwidth, Some(500000));
    assert!(manifest.audio_tracks.is_empty());

    Ok(())
}

#[test]
fn segments_indexed_in_manifest_order() -> anyhow::Result<()> {
    let text = "#EXTINF:4.0,\nseg0.ts\n#EXTINF:4.0,\nseg1.ts";
    let manifest = segment_manifest(text, "https://cdn.example/live/media.m3u8")?;

    assert_eq!(
        manifest.segments,
        vec![
            Segment {
                index: 0,
                duration: 4.0,
                url: "https://cdn.example/live/seg0.ts".to_string(),
            },
            Segment {
                index: 1,
                duration: 4.0,
                url: "https://cdn.example/live/seg1.ts".to_string(),
            },
        ]
    );

    Ok(())
}

#[test]
fn simple_media_playlist() -> anyhow::Result<()> {
    let data = include_str!("../fixtures/hls/simple-media-playlist.m3u8");
    let manifest = segment_manifest(data, "https://example.com/playlist.m3u8")?;

    assert!(!manifest.is_endless());
    assert_eq!(manifest.target_duration(), Some(10.));
    assert_eq!(manifest.segments.len(), 3);
    assert_eq!(manifest.segments[0].url, "http://media.example.com/first.ts");
    assert_eq!(manifest.segments[2].url, "http://media.example.com/third.ts");
    assert_eq!(manifest.segments[2].duration, 3.003);
    for (i, segment) in manifest.segments.iter().enumerate() {
        assert_eq!(segment.index, i);
    }

    Ok(())
}

#[test]
fn master_playlist() -> anyhow::Result<()> {
    let data = include_str!("../fixtures/hls/master-playlist.m3u8");
    let manifest = variant_manifest(data, "http://example.com/master.m3u8")?;

    let urls: Vec<&str> = manifest.streams.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "http://example.com/hi.m3u8",
            "http://example.com/mid.m3u8",
            "http://example.com/low.m3u8",
            "http://example.com/audio-only.m3u8",
        ]
    );
    assert!(manifest
        .streams
        .windows(2)
        .all(|pair| pair[0].bandwidth >= pair[1].bandwidth));

    // no CODECS means audio is assumed to be present
    assert!(manifest.streams[0].has_embedded_audio);
    assert_eq!(manifest.streams[3].codecs.as_deref(), Some("mp4a.40.5"));
    assert!(manifest.streams[3].has_embedded_audio);

    Ok(())
}

#[test]
fn alternative_audio_playlist() -> anyhow::Result<()> {
    let data = include_str!("../fixtures/hls/alternative-audio.m3u8");
    let manifest = variant_manifest(data, "https://cdn.example/vod/master.m3u8")?;

    let hi = &manifest.streams[0];
    assert_eq!(hi.url, "https://cdn.example/hi/video-only.m3u8");
    assert_eq!(hi.bandwidth, Some(7680000));
    assert_eq!(hi.resolution.as_deref(), Some("1920x1080"));
    assert_eq!(hi.frame_rate, Some(59.94));
    assert_eq!(hi.codecs.as_deref(), Some("avc1.640028"));
    assert_eq!(hi.audio_group_id.as_deref(), Some("aac"));
    assert!(!hi.has_embedded_audio);
    assert_eq!(hi.label(), "1080p 60fps");
    assert_eq!(manifest.streams[1].label(), "720p");
    assert_eq!(
        manifest.streams[2].url,
        "https://cdn.example/vod/low/video-only.m3u8"
    );

    // subtitles and renditions without URI are left out
    assert_eq!(manifest.audio_tracks.len(), 3);
    let english = &manifest.audio_tracks[0];
    assert_eq!(english.url, "https://cdn.example/vod/main/english-audio.m3u8");
    assert_eq!(english.group_id, "aac");
    assert_eq!(english.name, "English");
    assert_eq!(english.language, "en");
    assert!(english.is_default);

    let commentary = &manifest.audio_tracks[2];
    assert_eq!(commentary.language, "Unknown");
    assert!(!commentary.is_default);

    Ok(())
}

#[test]
fn quoted_commas_stay_in_codecs() -> anyhow::Result<()> {
    let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1000,CODECS=\"avc1.64001f,mp4a.40.2\",RESOLUTION=1280x720
muxed.m3u8";
    let manifest = variant_manifest(text, "https://cdn.example/master.m3u8")?;

    let stream = &manifest.streams[0];
    assert_eq!(stream.codecs.as_deref(), Some("avc1.64001f,mp4a.40.2"));
    assert_eq!(stream.resolution.as_deref(), Some("1280x720"));
    assert!(stream.has_embedded_audio);

    Ok(())
}

#[test]
fn equal_bandwidth_keeps_manifest_order() -> anyhow::Result<()> {
    let text = "#EXT-X-STREAM-INF:BANDWIDTH=1000
a.m3u8
#EXT-X-STREAM-INF:RESOLUTION=640x360
b.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1000
c.m3u8";
    let manifest = variant_manifest(text, "https://cdn.example/master.m3u8")?;

    let urls: Vec<&str> = manifest.streams.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://cdn.example/a.m3u8",
            "https://cdn.example/c.m3u8",
            "https://cdn.example/b.m3u8",
        ]
    );

    Ok(())
}

#[test]
fn blank_lines_and_comments_are_ignored() -> anyhow::Result<()> {
    let text = "#EXTM3U

#EXTINF:2.5,title
# a comment

../shared/seg0.ts
#EXTINF:2.5,
/abs/seg1.ts
";
    let manifest = segment_manifest(text, "https://cdn.example/a/b/media.m3u8?token=1")?;

    assert_eq!(manifest.segments.len(), 2);
    assert_eq!(manifest.segments[0].url, "https://cdn.example/a/shared/seg0.ts");
    assert_eq!(manifest.segments[1].url, "https://cdn.example/abs/seg1.ts");

    Ok(())
}

#[test]
fn resolve_is_idempotent() -> anyhow::Result<()> {
    let base = "https://cdn.example:8443/a/b/c/index.m3u8";
    for url in [
        "seg.ts",
        "../seg.ts",
        "../../../../seg.ts",
        "/root.ts",
        "//other.example/x.ts",
        "https://absolute.example/y.ts",
    ] {
        let resolved = resolve(url, base)?;
        assert!(resolved.contains("://"), "{resolved} is not absolute");
        assert_eq!(resolve(&resolved, base)?, resolved);
    }
    assert_eq!(
        resolve("/root.ts", base)?,
        "https://cdn.example:8443/root.ts"
    );
    assert_eq!(
        resolve("../../../../seg.ts", base)?,
        "https://cdn.example:8443/seg.ts"
    );

    Ok(())
}
