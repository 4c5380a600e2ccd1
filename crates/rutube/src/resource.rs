use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RutubeError, RutubeResult};

/// Video page url: optional scheme, fixed host, `/video/<id>` and an optional trailing slash.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:https?://)?rutube\.ru/video/([A-Za-z0-9]+)/?$").unwrap());

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// A validated reference to one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    raw_input: String,
    canonical_url: String,
    id: String,
}

impl ResourceReference {
    pub const URL_TEMPLATE_PREFIX: &str = "https://rutube.ru/video/";

    /// Accepts either a full video url or a bare video id.
    pub fn identify<S>(input: S) -> RutubeResult<Self>
    where
        S: Into<String>,
    {
        let raw_input = input.into();

        let id = if let Some(captures) = URL_PATTERN.captures(&raw_input) {
            captures[1].to_string()
        } else if ID_PATTERN.is_match(&raw_input) {
            raw_input.clone()
        } else {
            return Err(RutubeError::InvalidResource(raw_input));
        };

        Ok(Self {
            canonical_url: format!("{}{id}/", Self::URL_TEMPLATE_PREFIX),
            raw_input,
            id,
        })
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::str::FromStr for ResourceReference {
    type Err = RutubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::identify(s)
    }
}
