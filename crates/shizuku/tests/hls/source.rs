use shizuku::{
    fetch::HttpFetcher,
    hls::{load_playlist, Playlist},
    ShizukuError,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{common::FakeFetcher, hls::setup_mock_server};

#[tokio::test]
async fn load_media_playlist() -> anyhow::Result<()> {
    let data = include_str!("../fixtures/hls/simple-media-playlist.m3u8");
    let (uri, _server) = setup_mock_server(data).await;

    let playlist = load_playlist(&HttpFetcher::default(), &uri, 1).await?;
    let Playlist::Segment(manifest) = playlist else {
        anyhow::bail!("expected a segment manifest");
    };
    assert_eq!(manifest.segments.len(), 3);
    assert!((manifest.total_duration() - 21.021).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn load_variant_playlist_resolves_against_server() -> anyhow::Result<()> {
    let data = include_str!("../fixtures/hls/alternative-audio.m3u8");
    let (uri, server) = setup_mock_server(data).await;

    let playlist = load_playlist(&HttpFetcher::default(), &uri, 1).await?;
    let Playlist::Variant(manifest) = playlist else {
        anyhow::bail!("expected a variant manifest");
    };
    assert_eq!(
        manifest.streams[0].url,
        format!("{}/hi/video-only.m3u8", server.uri())
    );
    assert_eq!(
        manifest.audio_tracks[0].url,
        format!("{}/main/english-audio.m3u8", server.uri())
    );

    Ok(())
}

#[tokio::test]
async fn load_playlist_retries() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.m3u8"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("#EXTINF:1,\na.ts\n"))
        .mount(&server)
        .await;
    let uri = format!("{}/flaky.m3u8", server.uri());

    let playlist = load_playlist(&HttpFetcher::default(), &uri, 3).await?;
    assert!(matches!(playlist, Playlist::Segment(m) if m.segments.len() == 1));

    Ok(())
}

#[tokio::test]
async fn load_playlist_gives_up() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.m3u8"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    let uri = format!("{}/missing.m3u8", server.uri());

    let result = load_playlist(&HttpFetcher::default(), &uri, 2).await;
    assert!(matches!(
        result,
        Err(ShizukuError::HttpError(status)) if status == 404
    ));

    Ok(())
}

#[tokio::test]
async fn load_playlist_rejects_invalid_utf8() -> anyhow::Result<()> {
    const BODY: &[u8] = b"#EXTM3U\n#EXTINF:4.0,\nseg\xff\xfe.ts\n";

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY.to_vec()))
        .mount(&server)
        .await;
    let uri = format!("{}/broken.m3u8", server.uri());
    let result = load_playlist(&HttpFetcher::default(), &uri, 1).await;
    assert!(matches!(result, Err(ShizukuError::ParseError(_))));

    // fetchers relying on the default manifest decoding behave the same
    let url = "https://cdn.example/broken.m3u8";
    let fetcher = FakeFetcher::new().body(url, BODY);
    let result = load_playlist(&fetcher, url, 1).await;
    assert!(matches!(result, Err(ShizukuError::ParseError(_))));

    Ok(())
}
