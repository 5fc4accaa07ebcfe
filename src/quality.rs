#![forbid(unsafe_code)]

use crate::error::ValidationError;
use std::fmt;

pub const DEFAULT_VIDEO_QUALITY: &str = "1080p";
pub const DEFAULT_AUDIO_KBPS: u32 = 192;
pub const MIN_AUDIO_KBPS: u32 = 64;
pub const MAX_AUDIO_KBPS: u32 = 320;

/// Canonical video quality: either "let the engine pick" or a height cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoQuality {
    Auto,
    MaxHeight(u32),
}

impl VideoQuality {
    /// Maps a user token through the alias table. Canonical forms (`auto`,
    /// `1440`, `1080`, `720`) are accepted too, so parsing is idempotent.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "auto" | "best" => Ok(Self::Auto),
            "2k" | "1440p" | "1440" => Ok(Self::MaxHeight(1440)),
            "fullhd" | "fhd" | "1080p" | "1080" => Ok(Self::MaxHeight(1080)),
            "hd" | "720p" | "720" => Ok(Self::MaxHeight(720)),
            _ => Err(ValidationError::VideoQuality(token.to_string())),
        }
    }

    pub fn max_height(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::MaxHeight(height) => Some(height),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::MaxHeight(height) => write!(f, "{height}"),
        }
    }
}

/// MP3 bitrate in kbps, always within `[64, 320]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioQuality(u32);

impl AudioQuality {
    pub fn new(kbps: i64) -> Result<Self, ValidationError> {
        if (MIN_AUDIO_KBPS as i64..=MAX_AUDIO_KBPS as i64).contains(&kbps) {
            Ok(Self(kbps as u32))
        } else {
            Err(ValidationError::AudioQuality(kbps))
        }
    }

    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let trimmed = token.trim();
        let kbps = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::AudioQualityNotNumber(trimmed.to_string()))?;
        Self::new(kbps)
    }

    pub fn kbps(self) -> u32 {
        self.0
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self(DEFAULT_AUDIO_KBPS)
    }
}
