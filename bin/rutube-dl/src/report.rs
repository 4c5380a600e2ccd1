use std::{fmt, path::PathBuf};

use rutube::RutubeError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub downloaded: usize,
    pub invalid: usize,
    pub failed: usize,
    pub interrupted: usize,
}

impl Summary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: &Result<PathBuf, RutubeError>) {
        match result {
            Ok(_) => self.downloaded += 1,
            Err(RutubeError::InvalidResource(_)) => self.invalid += 1,
            Err(e) if e.is_interrupted() => self.interrupted += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Inputs never started because the queue was interrupted.
    pub fn skipped(&self) -> usize {
        self.total
            - (self.downloaded + self.invalid + self.failed + self.interrupted).min(self.total)
    }

    pub fn is_success(&self) -> bool {
        self.downloaded == self.total
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, downloaded: {}, invalid: {}, failed: {}",
            self.total, self.downloaded, self.invalid, self.failed
        )?;
        let stopped = self.interrupted + self.skipped();
        if stopped > 0 {
            write!(f, ", interrupted: {stopped}")?;
        }
        Ok(())
    }
}

/// One-line message telling what went wrong with a video.
pub fn describe(input: &str, error: &RutubeError) -> String {
    use RutubeError::*;

    match error {
        InvalidResource(_) => format!("Invalid url: {input}"),
        ApiResponse(_) | ManifestUrlMissing | JsonError(_) => {
            format!("Rutube API error for {input}: {error}")
        }
        MasterManifest(_) | UninitializedResolver | MasterPlaylistInitialization => {
            format!("Playlist error for {input}: {error}")
        }
        InvalidQuality(_) | QualityNotAvailable(_) => format!("Quality error: {error}"),
        SegmentDownload(_) => format!("Download of {input} failed: {error}"),
        DownloadInterrupted => format!("Download of {input} interrupted"),
        OutputDirMissing(path) => {
            format!("Output directory {} does not exist", path.display())
        }
        HttpError(_) | RequestError(_) | UrlParseError(_) => {
            format!("Network error for {input}: {error}")
        }
        IOError(_) => format!("File error: {error}"),
        SessionFinished => format!("{input}: {error}"),
    }
}

/// Formats seconds as `m:ss`, or `h:mm:ss` for long videos.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.).round() as u64;
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
