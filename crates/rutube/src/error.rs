use std::path::PathBuf;

use thiserror::Error;

use crate::Quality;

#[derive(Error, Debug)]
pub enum RutubeError {
    #[error("Invalid rutube url or video id: {0:?}")]
    InvalidResource(String),

    #[error("API response error: {0}")]
    ApiResponse(String),

    #[error("M3U8 playlist URL not found in API response")]
    ManifestUrlMissing,

    #[error("Invalid master playlist: {0}")]
    MasterManifest(String),

    #[error("Master playlist is not resolved yet")]
    UninitializedResolver,

    #[error("Invalid quality: {0}")]
    InvalidQuality(String),

    #[error("Quality {0} is not available")]
    QualityNotAvailable(Quality),

    #[error("Segment download error: {0}")]
    SegmentDownload(String),

    #[error("Master playlist is not initialized, call fetch_info() first")]
    MasterPlaylistInitialization,

    #[error("Download interrupted")]
    DownloadInterrupted,

    #[error("Session has already finished")]
    SessionFinished,

    #[error("Output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl RutubeError {
    /// Errors of the connection class: the request may succeed when sent again.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::RequestError(_) | Self::HttpError(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::DownloadInterrupted)
    }
}

pub type RutubeResult<T> = Result<T, RutubeError>;
