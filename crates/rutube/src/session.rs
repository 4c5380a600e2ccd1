use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::Client;

use crate::{
    api::{RutubeApi, VideoMetadata},
    config::SessionConfig,
    download::{InterruptHandle, Progress, ProgressCallback, SegmentDownloader},
    error::{RutubeError, RutubeResult},
    playlist::{MasterPlaylist, QualityMap},
    resource::ResourceReference,
    segment::{self, SegmentList},
    util::{sanitize_title, UNKNOWN_FILENAME},
    Quality,
};

/// Extension of the downloaded file.
pub const VIDEO_FORMAT: &str = "mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    InfoFetched,
    QualitySelected,
    Downloading,
    Completed,
    Failed,
    Interrupted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Interrupted)
    }
}

/// What [`DownloadSession::fetch_info`] tells about the video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub title: String,
    pub author: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Available qualities, from the lowest to the best
    pub qualities: Vec<Quality>,
}

/// Download of a single video.
///
/// `fetch_info` → `select_quality` (optional, the best quality is picked otherwise) → `download`.
/// A session is single-use: once it reached a terminal state, every operation
/// fails with [`RutubeError::SessionFinished`].
pub struct DownloadSession {
    config: SessionConfig,
    client: Client,
    api: RutubeApi,
    resource: ResourceReference,

    state: SessionState,
    title: String,
    filename: String,
    qualities: Option<QualityMap>,
    selected: Option<Quality>,
    segments: Option<SegmentList>,

    interrupt: InterruptHandle,
    progress: Arc<Progress>,
    on_progress: Option<ProgressCallback>,
    elapsed: Option<Duration>,
}

impl DownloadSession {
    pub fn new<S>(input: S, config: SessionConfig) -> RutubeResult<Self>
    where
        S: Into<String>,
    {
        let client = config.client()?;
        Self::with_client(input, config, client)
    }

    pub fn with_client<S>(input: S, config: SessionConfig, client: Client) -> RutubeResult<Self>
    where
        S: Into<String>,
    {
        let resource = ResourceReference::identify(input)?;
        let api = RutubeApi::new(client.clone(), config.api_base.clone(), config.api_retry);

        Ok(Self {
            config,
            client,
            api,
            resource,

            state: SessionState::Created,
            title: VideoMetadata::UNKNOWN_TITLE.to_string(),
            filename: UNKNOWN_FILENAME.to_string(),
            qualities: None,
            selected: None,
            segments: None,

            interrupt: InterruptHandle::default(),
            progress: Arc::new(Progress::default()),
            on_progress: None,
            elapsed: None,
        })
    }

    /// Sets the callback receiving `(completed, total)` segment counts while downloading.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Shares an interrupt flag with other sessions, e.g. to stop a whole queue at once.
    pub fn with_interrupt_handle(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub async fn fetch_info(&mut self) -> RutubeResult<VideoInfo> {
        self.ensure_not_finished()?;

        let metadata = self.api.fetch_metadata(self.resource.id()).await?;
        let manifest_url = metadata.manifest_url()?;

        let qualities = MasterPlaylist::new(self.client.clone(), manifest_url)
            .with_retry(self.config.api_retry)
            .run()
            .await
            .inspect_err(|e| {
                if matches!(
                    e,
                    RutubeError::MasterManifest(_) | RutubeError::UninitializedResolver
                ) {
                    self.state = SessionState::Failed;
                }
            })?;

        self.title = metadata.title().to_string();
        self.filename = sanitize_title(&self.title);
        let info = VideoInfo {
            title: self.title.clone(),
            author: metadata.author_name().map(str::to_string),
            duration: metadata.duration,
            qualities: qualities.qualities(),
        };
        log::info!(
            "Video info fetched: {} ({} qualities).",
            self.title,
            qualities.len()
        );

        self.qualities = Some(qualities);
        self.selected = None;
        self.segments = None;
        self.state = SessionState::InfoFetched;
        Ok(info)
    }

    /// Resolves the segments of `quality`.
    ///
    /// An invalid or unavailable quality leaves the session usable, another
    /// quality can be selected afterwards.
    pub async fn select_quality(&mut self, quality: Quality) -> RutubeResult<()> {
        self.ensure_not_finished()?;
        let qualities = self
            .qualities
            .as_ref()
            .ok_or(RutubeError::MasterPlaylistInitialization)?;

        let segments =
            segment::select_quality(&self.client, qualities, quality, self.config.api_retry)
                .await?;

        self.selected = Some(quality);
        self.segments = Some(segments);
        self.state = SessionState::QualitySelected;
        Ok(())
    }

    pub async fn select_best_quality(&mut self) -> RutubeResult<Quality> {
        let best = self
            .qualities
            .as_ref()
            .ok_or(RutubeError::MasterPlaylistInitialization)?
            .best()
            .ok_or_else(|| RutubeError::MasterManifest("no quality available".to_string()))?;
        self.select_quality(best).await?;
        Ok(best)
    }

    /// Downloads the selected quality into `<output_dir>/<sanitized title>.mp4`.
    pub async fn download(&mut self) -> RutubeResult<PathBuf> {
        self.ensure_not_finished()?;
        if self.qualities.is_none() {
            return Err(RutubeError::MasterPlaylistInitialization);
        }
        if self.interrupt.is_interrupted() {
            self.state = SessionState::Interrupted;
            return Err(RutubeError::DownloadInterrupted);
        }
        if !self.config.output_dir.is_dir() {
            return Err(RutubeError::OutputDirMissing(self.config.output_dir.clone()));
        }

        if self.segments.is_none() {
            self.select_best_quality().await?;
        }
        let Some(segments) = self.segments.as_ref() else {
            return Err(RutubeError::MasterPlaylistInitialization);
        };

        let path = self.output_path();
        let mut downloader = SegmentDownloader::new(self.client.clone())
            .batch_size(self.config.batch_size)
            .retry(self.config.segment_retry)
            .interrupt(self.interrupt.clone())
            .progress(self.progress.clone());
        if let Some(on_progress) = &self.on_progress {
            downloader = downloader.on_progress(on_progress.clone());
        }

        self.state = SessionState::Downloading;
        let started_at = Instant::now();
        let result = downloader.download_to_file(segments, &path).await;

        match result {
            Ok(()) => {
                let elapsed = started_at.elapsed();
                self.elapsed = Some(elapsed);
                self.state = SessionState::Completed;
                log::info!(
                    "Downloaded {} in {:.1} minutes",
                    self.title,
                    elapsed.as_secs_f64() / 60.
                );
                Ok(path)
            }
            Err(e) => {
                self.state = if e.is_interrupted() {
                    SessionState::Interrupted
                } else {
                    SessionState::Failed
                };
                log::error!("Failed to download {}: {e}", self.title);
                Err(e)
            }
        }
    }

    fn ensure_not_finished(&self) -> RutubeResult<()> {
        if self.state.is_terminal() {
            return Err(RutubeError::SessionFinished);
        }
        Ok(())
    }

    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
    }

    /// Handle to interrupt the session from another thread or task.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn resource(&self) -> &ResourceReference {
        &self.resource
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn output_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}.{VIDEO_FORMAT}", self.filename))
    }

    pub fn qualities(&self) -> Option<&QualityMap> {
        self.qualities.as_ref()
    }

    pub fn selected_quality(&self) -> Option<Quality> {
        self.selected
    }

    pub fn segments(&self) -> Option<&SegmentList> {
        self.segments.as_ref()
    }

    /// `(completed, total)` segments of the current download.
    pub fn progress(&self) -> (usize, usize) {
        (self.progress.completed(), self.progress.total())
    }

    /// Time spent downloading segments, once completed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}
