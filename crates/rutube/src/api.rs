use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    error::{RutubeError, RutubeResult},
    fetch::fetch_bytes,
    retry::RetryConfig,
};

/// Subset of the play options response the downloader relies on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub author: Option<Author>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub video_balancer: Option<VideoBalancer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoBalancer {
    pub m3u8: Option<String>,
}

impl VideoMetadata {
    pub const UNKNOWN_TITLE: &str = "Unknown";

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::UNKNOWN_TITLE)
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref()?.name.as_deref()
    }

    /// Location of the master playlist.
    ///
    /// A response without it was received fine but is malformed, so this is
    /// reported as [`RutubeError::ManifestUrlMissing`] rather than a network error.
    pub fn manifest_url(&self) -> RutubeResult<Url> {
        let url = self
            .video_balancer
            .as_ref()
            .and_then(|balancer| balancer.m3u8.as_deref())
            .ok_or(RutubeError::ManifestUrlMissing)?;
        Ok(Url::parse(url)?)
    }
}

/// Client of the play options endpoint.
#[derive(Clone)]
pub struct RutubeApi {
    client: Client,
    api_base: String,
    retry: RetryConfig,
}

impl RutubeApi {
    pub fn new<S>(client: Client, api_base: S, retry: RetryConfig) -> Self
    where
        S: Into<String>,
    {
        let mut api_base = api_base.into();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        Self {
            client,
            api_base,
            retry,
        }
    }

    pub fn options_url(&self, video_id: &str) -> RutubeResult<Url> {
        let mut url = Url::parse(&format!("{}{video_id}/", self.api_base))?;
        url.query_pairs_mut()
            .append_pair("no_404", "true")
            .append_pair("referer", "https://rutube.ru")
            .append_pair("pver", "v2");
        Ok(url)
    }

    pub async fn fetch_metadata(&self, video_id: &str) -> RutubeResult<VideoMetadata> {
        let url = self.options_url(video_id)?;
        log::info!("Fetching video info of {video_id}.");

        let body = self
            .retry
            .run(
                || fetch_bytes(&self.client, url.clone()),
                || RutubeError::ApiResponse("Failed to fetch API response".to_string()),
            )
            .await?;

        serde_json::from_slice(&body).map_err(|e| {
            log::debug!("API response body: {}", String::from_utf8_lossy(&body));
            RutubeError::ApiResponse(format!("Unparseable API response: {e}"))
        })
    }
}
