use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use rutube::SessionConfig;

use crate::config;

#[derive(Parser, Debug, Clone)]
#[clap(name = "rutube-dl", version, about = "Download videos from rutube.ru")]
pub struct RutubeArgs {
    /// Video url or id
    ///
    /// eg. https://rutube.ru/video/2ce725b3dc1a243f8456458975ecd872/
    #[clap(required_unless_present = "file")]
    pub url: Option<String>,

    /// Directory to save videos in. Defaults to the current directory.
    #[clap(short, long, value_parser = existing_dir)]
    pub output: Option<PathBuf>,

    /// Choose the quality interactively instead of downloading the best one
    #[clap(short, long)]
    pub quality: bool,

    /// Read urls to download from a file
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Delimiter between urls in the file given by --file
    #[clap(short, long, default_value = "\n")]
    pub delimiter: String,

    /// Segments downloaded at the same time
    #[clap(long)]
    pub batch_size: Option<NonZeroUsize>,

    /// Attempts of every api request and segment download, at least 1
    #[clap(long)]
    pub retries: Option<NonZeroU32>,

    /// HTTP timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// TOML file with session settings. Command line options take precedence.
    #[clap(long, env = "RUTUBE_DL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug output
    #[clap(long, alias = "debug")]
    pub verbose: bool,
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("directory {value} does not exist"))
    }
}

impl RutubeArgs {
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => config::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(retries) = self.retries {
            config.api_retry.attempts = retries;
            config.segment_retry.attempts = retries;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.verbose |= self.verbose;

        Ok(config)
    }

    /// Inputs to download, the positional url first, then the ones from `--file`.
    pub fn urls(&self) -> anyhow::Result<Vec<String>> {
        let mut urls: Vec<String> = self.url.iter().cloned().collect();
        if let Some(file) = &self.file {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read url list {}", file.display()))?;
            urls.extend(split_urls(&content, &self.delimiter));
        }
        Ok(urls)
    }
}

pub fn split_urls(content: &str, delimiter: &str) -> Vec<String> {
    let delimiter = if delimiter.is_empty() { "\n" } else { delimiter };
    content
        .split(delimiter)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
