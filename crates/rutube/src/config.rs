use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use fake_user_agent::get_chrome_rua;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::RutubeResult, retry::RetryConfig};

/// Settings of one download session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory the video is written to. Must exist.
    pub output_dir: PathBuf,
    /// How many segments are fetched at the same time.
    pub batch_size: NonZeroUsize,
    pub api_retry: RetryConfig,
    pub segment_retry: RetryConfig,
    /// HTTP timeout, in seconds
    pub timeout: u64,
    /// Base of the play options endpoint, the video id is appended to it.
    pub api_base: String,
    pub user_agent: Option<String>,
    /// Debug output wanted by the front end. The library only logs through
    /// `log`/`tracing`, so it is up to the front end to raise its log level.
    pub verbose: bool,
}

impl SessionConfig {
    pub const DEFAULT_API_BASE: &str = "https://rutube.ru/api/play/options/";
    pub const DEFAULT_BATCH_SIZE: usize = 20;

    pub fn new<P>(output_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_api_retry(mut self, retry: RetryConfig) -> Self {
        self.api_retry = retry;
        self
    }

    pub fn with_segment_retry(mut self, retry: RetryConfig) -> Self {
        self.segment_retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_base<S>(mut self, api_base: S) -> Self
    where
        S: Into<String>,
    {
        self.api_base = api_base.into();
        self
    }

    pub fn with_user_agent<S>(mut self, user_agent: S) -> Self
    where
        S: Into<String>,
    {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn client(&self) -> RutubeResult<Client> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| get_chrome_rua().to_string());

        Ok(Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout))
            .build()?)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            batch_size: NonZeroUsize::new(Self::DEFAULT_BATCH_SIZE).unwrap(),
            api_retry: RetryConfig::default(),
            segment_retry: RetryConfig::default(),
            timeout: 10,
            api_base: Self::DEFAULT_API_BASE.to_string(),
            user_agent: None,
            verbose: false,
        }
    }
}
