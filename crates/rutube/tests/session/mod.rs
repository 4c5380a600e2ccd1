use std::{
    num::NonZeroUsize,
    path::Path,
    sync::{Arc, Mutex},
};

use reqwest::Client;
use rutube::{DownloadSession, Quality, RutubeError, SessionConfig, SessionState, SessionWorker};
use wiremock::MockServer;

use crate::{no_delay_retry, segment_payload, RutubeMock, VIDEO_ID};

fn config(server: &MockServer, output_dir: &Path) -> SessionConfig {
    SessionConfig::new(output_dir)
        .with_api_base(format!("{}/api/play/options/", server.uri()))
        .with_api_retry(no_delay_retry(2))
        .with_segment_retry(no_delay_retry(2))
}

fn session(server: &MockServer, output_dir: &Path) -> anyhow::Result<DownloadSession> {
    Ok(DownloadSession::with_client(
        format!("https://rutube.ru/video/{VIDEO_ID}/"),
        config(server, output_dir),
        Client::new(),
    )?)
}

fn expected_video() -> Vec<u8> {
    (1..=5).flat_map(segment_payload).collect()
}

#[tokio::test]
async fn download_best_quality() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = calls.clone();
    let mut session = session(&server, dir.path())?.on_progress(move |completed, total| {
        recorder.lock().unwrap().push((completed, total));
    });
    assert_eq!(session.state(), SessionState::Created);

    let info = session.fetch_info().await?;
    assert_eq!(info.title, "Test Video - 123 ...");
    assert_eq!(info.author.as_deref(), Some("Test Author"));
    assert_eq!(info.duration, Some(62.));
    assert_eq!(info.qualities, [Quality::new(640, 360)?, Quality::HD]);
    assert_eq!(session.state(), SessionState::InfoFetched);
    assert_eq!(session.filename(), "test_video_123");

    let best = session.qualities().and_then(|q| q.best()).unwrap();
    session.select_quality(best).await?;
    assert_eq!(session.state(), SessionState::QualitySelected);
    assert_eq!(session.selected_quality(), Some(Quality::HD));
    assert_eq!(session.segments().map(|s| s.len()), Some(5));

    let path = session.download().await?;
    assert_eq!(path, dir.path().join("test_video_123.mp4"));
    assert_eq!(tokio::fs::read(&path).await?, expected_video());
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.progress(), (5, 5));
    assert!(session.elapsed().is_some());
    assert_eq!(calls.lock().unwrap().last(), Some(&(5, 5)));

    Ok(())
}

#[tokio::test]
async fn download_selects_best_quality_automatically() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;

    let mut session = DownloadSession::with_client(
        VIDEO_ID,
        config(&server, dir.path()).with_batch_size(NonZeroUsize::new(2).unwrap()),
        Client::new(),
    )?;
    session.fetch_info().await?;
    let path = session.download().await?;

    assert_eq!(session.selected_quality(), Some(Quality::HD));
    assert_eq!(tokio::fs::read(&path).await?, expected_video());
    assert_eq!(session.state(), SessionState::Completed);

    Ok(())
}

#[tokio::test]
async fn operations_before_fetch_info() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;

    assert!(matches!(
        session.select_quality(Quality::FULL_HD).await,
        Err(RutubeError::MasterPlaylistInitialization)
    ));
    assert!(matches!(
        session.download().await,
        Err(RutubeError::MasterPlaylistInitialization)
    ));
    assert_eq!(session.state(), SessionState::Created);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}

#[tokio::test]
async fn unavailable_quality_keeps_session_usable() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;
    session.fetch_info().await?;

    assert!(matches!(
        session.select_quality(Quality::FULL_HD).await,
        Err(RutubeError::QualityNotAvailable(Quality::FULL_HD))
    ));
    assert!(matches!(
        session
            .select_quality(Quality {
                width: 0,
                height: 0
            })
            .await,
        Err(RutubeError::InvalidQuality(_))
    ));
    assert_eq!(session.state(), SessionState::InfoFetched);

    session.select_quality(Quality::HD).await?;
    assert_eq!(session.state(), SessionState::QualitySelected);

    Ok(())
}

#[tokio::test]
async fn invalid_resource() {
    let result = DownloadSession::new(
        "https://rutube.ru/video/abc/extra",
        SessionConfig::default(),
    );
    assert!(matches!(result, Err(RutubeError::InvalidResource(_))));
}

#[tokio::test]
async fn api_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock_status(&format!("/api/play/options/{VIDEO_ID}/"), 500)
        .await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;

    assert!(matches!(
        session.fetch_info().await,
        Err(RutubeError::ApiResponse(_))
    ));
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 2);
    assert_eq!(session.state(), SessionState::Created);

    Ok(())
}

#[tokio::test]
async fn api_response_is_not_json() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(&format!("/api/play/options/{VIDEO_ID}/"), "<html></html>")
        .await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;

    assert!(matches!(
        session.fetch_info().await,
        Err(RutubeError::ApiResponse(_))
    ));
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);

    Ok(())
}

#[tokio::test]
async fn api_response_without_manifest() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock(
            &format!("/api/play/options/{VIDEO_ID}/"),
            r#"{"title": "No balancer", "video_balancer": {}}"#,
        )
        .await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;

    assert!(matches!(
        session.fetch_info().await,
        Err(RutubeError::ManifestUrlMissing)
    ));
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);

    Ok(())
}

#[tokio::test]
async fn invalid_master_playlist_fails_session() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video("#EXTM3U\n#EXT-X-ENDLIST\n").await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;

    assert!(matches!(
        session.fetch_info().await,
        Err(RutubeError::MasterManifest(_))
    ));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(matches!(
        session.fetch_info().await,
        Err(RutubeError::SessionFinished)
    ));

    Ok(())
}

#[tokio::test]
async fn missing_output_directory() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing");
    let mut session = session(&server, &missing)?;
    session.fetch_info().await?;

    assert!(matches!(
        session.download().await,
        Err(RutubeError::OutputDirMissing(path)) if path == missing
    ));
    assert!(!missing.exists());
    assert_eq!(server.segment_requests().await, 0);

    Ok(())
}

#[tokio::test]
async fn failed_segment_fails_download() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server
        .mock_status("/hls/720/segment-3-v1-a1.ts", 404)
        .await
        .mock_video(include_str!("../fixtures/master.m3u8"))
        .await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;
    session.fetch_info().await?;

    assert!(matches!(
        session.download().await,
        Err(RutubeError::SegmentDownload(_))
    ));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(matches!(
        session.download().await,
        Err(RutubeError::SessionFinished)
    ));

    Ok(())
}

#[tokio::test]
async fn interrupt_before_second_batch() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;

    let session = DownloadSession::with_client(
        VIDEO_ID,
        config(&server, dir.path()).with_batch_size(NonZeroUsize::new(2).unwrap()),
        Client::new(),
    )?;
    let handle = session.interrupt_handle();
    let mut session = session.on_progress(move |completed, _| {
        if completed == 2 {
            handle.interrupt();
        }
    });

    session.fetch_info().await?;
    session.select_quality(Quality::HD).await?;
    let result = session.download().await;

    assert!(result.as_ref().is_err_and(RutubeError::is_interrupted));
    assert_eq!(session.state(), SessionState::Interrupted);
    assert!(session.is_interrupted());
    assert_eq!(server.segment_requests().await, 2);

    Ok(())
}

#[tokio::test]
async fn interrupt_before_download() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    server.mock_video(include_str!("../fixtures/master.m3u8")).await;
    let dir = tempfile::tempdir()?;
    let mut session = session(&server, dir.path())?;
    session.fetch_info().await?;

    assert!(!session.is_interrupted());
    session.interrupt();
    assert!(session.is_interrupted());

    assert!(matches!(
        session.download().await,
        Err(RutubeError::DownloadInterrupted)
    ));
    assert_eq!(session.state(), SessionState::Interrupted);
    assert_eq!(server.segment_requests().await, 0);

    Ok(())
}

#[test]
fn session_on_worker_thread() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        server.mock_video(include_str!("../fixtures/master.m3u8")).await;
        server
    });
    let dir = tempfile::tempdir()?;

    let worker = SessionWorker::spawn()?;
    let mut session = session(&server, dir.path())?;
    let (session, path) = worker.submit_blocking(async move {
        session.fetch_info().await?;
        let path = session.download().await?;
        Ok::<_, RutubeError>((session, path))
    })??;

    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(std::fs::read(path)?, expected_video());

    Ok(())
}
