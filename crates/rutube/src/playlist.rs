use std::collections::{btree_map::Entry, BTreeMap};

use m3u8_rs::Playlist;
use reqwest::{Client, Url};

use crate::{
    error::{RutubeError, RutubeResult},
    fetch::fetch_text,
    retry::RetryConfig,
    util::{base_path, with_trailing_slash},
    Quality,
};

/// Reference to a quality-specific playlist found in the master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReference {
    /// Uri as written in the master playlist, absolute or relative.
    pub uri: String,
    /// Directory relative uris are resolved against.
    pub base_path: Url,
}

impl PlaylistReference {
    pub fn new<S>(uri: S, base_path: Url) -> Self
    where
        S: Into<String>,
    {
        Self {
            uri: uri.into(),
            base_path,
        }
    }

    /// Absolute url of the playlist, `None` when the reference has no usable uri.
    pub fn url(&self) -> Option<Url> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return None;
        }
        with_trailing_slash(&self.base_path).join(uri).ok()
    }
}

/// Available qualities and their playlists, sorted from the lowest to the best quality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityMap(BTreeMap<Quality, PlaylistReference>);

impl QualityMap {
    /// Builds the map keeping the first reference of every quality.
    ///
    /// Rutube lists every quality once per CDN; later duplicates are dropped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Quality, PlaylistReference)>,
    {
        let mut map = BTreeMap::new();
        for (quality, reference) in entries {
            match map.entry(quality) {
                Entry::Vacant(entry) => {
                    entry.insert(reference);
                }
                Entry::Occupied(_) => {
                    log::debug!("Duplicated quality {quality} ignored: {}", reference.uri);
                }
            }
        }
        Self(map)
    }

    pub fn get(&self, quality: &Quality) -> Option<&PlaylistReference> {
        self.0.get(quality)
    }

    pub fn best(&self) -> Option<Quality> {
        self.0.keys().next_back().copied()
    }

    pub fn qualities(&self) -> Vec<Quality> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Quality, &PlaylistReference)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses a master playlist body into a [`QualityMap`].
///
/// Variant streams without a resolution (audio only, i-frame streams) are skipped.
pub fn parse_master_playlist(body: &[u8], playlist_url: &Url) -> RutubeResult<QualityMap> {
    let playlist = match m3u8_rs::parse_playlist_res(body) {
        Ok(Playlist::MasterPlaylist(playlist)) => playlist,
        Ok(Playlist::MediaPlaylist(_)) => {
            return Err(RutubeError::MasterManifest(
                "expected a master playlist, got a media playlist".to_string(),
            ))
        }
        Err(_) => {
            return Err(RutubeError::MasterManifest(
                "failed to parse playlist".to_string(),
            ))
        }
    };

    let base = base_path(playlist_url);
    let mut entries = Vec::with_capacity(playlist.variants.len());
    for variant in playlist.variants {
        if variant.is_i_frame {
            continue;
        }
        let Some(resolution) = variant.resolution else {
            log::debug!("Variant stream without resolution skipped: {}", variant.uri);
            continue;
        };

        let quality = Quality::try_from_u64(resolution.width, resolution.height)
            .map_err(|e| RutubeError::MasterManifest(e.to_string()))?;
        entries.push((quality, PlaylistReference::new(variant.uri, base.clone())));
    }

    let qualities = QualityMap::from_entries(entries);
    if qualities.is_empty() {
        return Err(RutubeError::MasterManifest(
            "no variant stream with a resolution".to_string(),
        ));
    }
    Ok(qualities)
}

#[derive(Debug, Default)]
enum ResolverState {
    #[default]
    Created,
    Fetched(String),
    Resolved(QualityMap),
}

/// Downloads the master playlist and resolves the qualities it offers.
///
/// `fetch` must run before `resolve`; the quality map is only readable afterwards.
pub struct MasterPlaylist {
    client: Client,
    url: Url,
    retry: RetryConfig,
    state: ResolverState,
}

impl MasterPlaylist {
    pub fn new(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            retry: RetryConfig::default(),
            state: ResolverState::Created,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn fetch(&mut self) -> RutubeResult<()> {
        log::info!("Start fetching master playlist.");
        let body = self
            .retry
            .run(
                || fetch_text(&self.client, self.url.clone()),
                || RutubeError::ApiResponse("Failed to fetch master playlist".to_string()),
            )
            .await?;
        log::info!("Master playlist fetched.");

        self.state = ResolverState::Fetched(body);
        Ok(())
    }

    pub fn resolve(&mut self) -> RutubeResult<&QualityMap> {
        match std::mem::take(&mut self.state) {
            ResolverState::Created => Err(RutubeError::UninitializedResolver),
            ResolverState::Fetched(body) => {
                let qualities = parse_master_playlist(body.as_bytes(), &self.url);
                match qualities {
                    Ok(qualities) => {
                        self.state = ResolverState::Resolved(qualities);
                        self.qualities()
                    }
                    Err(e) => {
                        self.state = ResolverState::Fetched(body);
                        Err(e)
                    }
                }
            }
            state @ ResolverState::Resolved(_) => {
                self.state = state;
                self.qualities()
            }
        }
    }

    /// Fetches and resolves in one go.
    pub async fn run(mut self) -> RutubeResult<QualityMap> {
        self.fetch().await?;
        self.resolve()?;
        self.into_qualities()
    }

    pub fn qualities(&self) -> RutubeResult<&QualityMap> {
        match &self.state {
            ResolverState::Resolved(qualities) => Ok(qualities),
            _ => Err(RutubeError::UninitializedResolver),
        }
    }

    pub fn into_qualities(self) -> RutubeResult<QualityMap> {
        match self.state {
            ResolverState::Resolved(qualities) => Ok(qualities),
            _ => Err(RutubeError::UninitializedResolver),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ResolverState::Resolved(_))
    }
}
