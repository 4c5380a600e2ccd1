use m3u8_rs::Playlist;
use reqwest::{Client, Url};

use crate::{
    error::{RutubeError, RutubeResult},
    fetch::fetch_text,
    playlist::QualityMap,
    retry::RetryConfig,
    util::base_path,
    Quality,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in the media playlist, starts from 0
    pub sequence: u64,
    pub url: Url,
}

/// Segments of one quality, in playlist order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentList(Vec<Segment>);

impl SegmentList {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Builds a list from absolute urls, numbering them in order.
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = Url>,
    {
        Self(
            urls.into_iter()
                .enumerate()
                .map(|(sequence, url)| Segment {
                    sequence: sequence as u64,
                    url,
                })
                .collect(),
        )
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, Segment> {
        self.0.chunks(batch_size.max(1))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parses a media playlist, resolving relative segment uris against the playlist directory.
pub fn parse_media_playlist(body: &[u8], playlist_url: &Url) -> RutubeResult<SegmentList> {
    let playlist = match m3u8_rs::parse_playlist_res(body) {
        Ok(Playlist::MediaPlaylist(playlist)) => playlist,
        Ok(Playlist::MasterPlaylist(_)) => {
            return Err(RutubeError::ApiResponse(format!(
                "expected a media playlist at {playlist_url}"
            )))
        }
        Err(_) => {
            return Err(RutubeError::ApiResponse(format!(
                "failed to parse media playlist at {playlist_url}"
            )))
        }
    };

    let base = base_path(playlist_url);
    let urls = playlist
        .segments
        .iter()
        .map(|segment| base.join(segment.uri.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SegmentList::from_urls(urls))
}

/// Loads the segment list of `chosen`.
pub async fn select_quality(
    client: &Client,
    qualities: &QualityMap,
    chosen: Quality,
    retry: RetryConfig,
) -> RutubeResult<SegmentList> {
    if chosen.width == 0 || chosen.height == 0 {
        return Err(RutubeError::InvalidQuality(chosen.to_string()));
    }

    let playlist_url = qualities
        .get(&chosen)
        .and_then(|reference| reference.url())
        .ok_or(RutubeError::QualityNotAvailable(chosen))?;

    log::info!("Fetching playlist of quality {chosen}.");
    let body = retry
        .run(
            || fetch_text(client, playlist_url.clone()),
            || RutubeError::ApiResponse(format!("Failed to fetch playlist of quality {chosen}")),
        )
        .await?;

    let segments = parse_media_playlist(body.as_bytes(), &playlist_url)?;
    log::info!("{} segments found for quality {chosen}.", segments.len());
    Ok(segments)
}

/// Loads the segment list of the best quality available.
pub async fn select_best_quality(
    client: &Client,
    qualities: &QualityMap,
    retry: RetryConfig,
) -> RutubeResult<(Quality, SegmentList)> {
    let best = qualities.best().ok_or(RutubeError::MasterManifest(
        "no quality available".to_string(),
    ))?;
    let segments = select_quality(client, qualities, best, retry).await?;
    Ok((best, segments))
}
