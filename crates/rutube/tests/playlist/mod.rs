use reqwest::Client;
use rutube::{segment, MasterPlaylist, Quality, RutubeError};
use wiremock::MockServer;

use crate::{no_delay_retry, RutubeMock};

async fn resolve(server: &MockServer, master: &str) -> anyhow::Result<rutube::QualityMap> {
    server.mock("/route/master.m3u8", master).await;
    let url = format!("{}/route/master.m3u8", server.uri()).parse()?;
    let qualities = MasterPlaylist::new(Client::new(), url)
        .with_retry(no_delay_retry(2))
        .run()
        .await?;
    Ok(qualities)
}

#[tokio::test]
async fn master_playlist_qualities() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let qualities = resolve(&server, include_str!("../fixtures/master.m3u8")).await?;

    assert_eq!(qualities.len(), 2);
    assert_eq!(
        qualities.qualities(),
        [Quality::new(640, 360)?, Quality::new(1280, 720)?]
    );
    assert_eq!(qualities.best(), Some(Quality::HD));

    for (quality, reference) in qualities.iter() {
        let first = reference.url().unwrap();
        let second = qualities.get(quality).unwrap().url().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.as_str(),
            format!("{}/hls/{}/index.m3u8", server.uri(), quality.height)
        );
    }

    Ok(())
}

#[tokio::test]
async fn master_playlist_keeps_first_duplicate() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let qualities = resolve(
        &server,
        include_str!("../fixtures/master_duplicate.m3u8"),
    )
    .await?;

    assert_eq!(qualities.len(), 3);
    for (quality, reference) in qualities.iter() {
        assert_eq!(reference.uri, format!("/cdn1/{}/index.m3u8", quality.height));
    }
    assert_eq!(qualities.best(), Some(Quality::FULL_HD));

    Ok(())
}

#[tokio::test]
async fn master_playlist_invalid_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let result = resolve(&server, "<html>Not found</html>").await;

    let error = result.unwrap_err().downcast::<RutubeError>()?;
    assert!(matches!(error, RutubeError::MasterManifest(_)));

    Ok(())
}

#[tokio::test]
async fn master_playlist_fetch_exhausted() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_status("/route/master.m3u8", 503).await;

    let url = format!("{}/route/master.m3u8", server.uri()).parse()?;
    let result = MasterPlaylist::new(Client::new(), url)
        .with_retry(no_delay_retry(3))
        .run()
        .await;

    assert!(matches!(result, Err(RutubeError::ApiResponse(_))));
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);

    Ok(())
}

#[tokio::test]
async fn master_playlist_states() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock("/route/master.m3u8", include_str!("../fixtures/master.m3u8"))
        .await;

    let url = format!("{}/route/master.m3u8", server.uri()).parse()?;
    let mut playlist = MasterPlaylist::new(Client::new(), url);
    assert!(matches!(
        playlist.qualities(),
        Err(RutubeError::UninitializedResolver)
    ));

    playlist.fetch().await?;
    assert!(matches!(
        playlist.qualities(),
        Err(RutubeError::UninitializedResolver)
    ));

    assert_eq!(playlist.resolve()?.len(), 2);
    assert!(playlist.is_resolved());
    assert_eq!(playlist.qualities()?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn select_quality_segments() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock("/hls/720/index.m3u8", include_str!("../fixtures/media.m3u8"))
        .await;
    let qualities = resolve(&server, include_str!("../fixtures/master.m3u8")).await?;

    let client = Client::new();
    let segments =
        segment::select_quality(&client, &qualities, Quality::HD, no_delay_retry(1)).await?;
    assert_eq!(segments.len(), 5);
    for (index, segment) in segments.iter().enumerate() {
        assert_eq!(segment.sequence, index as u64);
        assert_eq!(
            segment.url.as_str(),
            format!("{}/hls/720/segment-{}-v1-a1.ts", server.uri(), index + 1)
        );
    }

    let (best, best_segments) =
        segment::select_best_quality(&client, &qualities, no_delay_retry(1)).await?;
    assert_eq!(best, Quality::HD);
    assert_eq!(best_segments, segments);

    let missing =
        segment::select_quality(&client, &qualities, Quality::FULL_HD, no_delay_retry(1)).await;
    assert!(matches!(
        missing,
        Err(RutubeError::QualityNotAvailable(Quality::FULL_HD))
    ));

    Ok(())
}
