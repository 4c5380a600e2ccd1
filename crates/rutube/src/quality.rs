use std::{fmt, str::FromStr};

use crate::error::{RutubeError, RutubeResult};

/// Video resolution. Ordering compares width first, then height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality {
    pub width: u32,
    pub height: u32,
}

impl Quality {
    pub const FULL_HD: Quality = Quality {
        width: 1920,
        height: 1080,
    };
    pub const HD: Quality = Quality {
        width: 1280,
        height: 720,
    };

    pub fn new(width: u32, height: u32) -> RutubeResult<Self> {
        if width == 0 || height == 0 {
            return Err(RutubeError::InvalidQuality(format!("{width}x{height}")));
        }
        Ok(Self { width, height })
    }

    /// Builds a quality from values of an untrusted source, e.g. a playlist attribute.
    pub fn try_from_u64(width: u64, height: u64) -> RutubeResult<Self> {
        let invalid = || RutubeError::InvalidQuality(format!("{width}x{height}"));
        let width = u32::try_from(width).map_err(|_| invalid())?;
        let height = u32::try_from(height).map_err(|_| invalid())?;
        Self::new(width, height)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Quality {
    type Err = RutubeError;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RutubeError::InvalidQuality(s.to_string());

        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = width.parse().map_err(|_| invalid())?;
        let height = height.parse().map_err(|_| invalid())?;
        Self::new(width, height)
    }
}
