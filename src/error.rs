#![forbid(unsafe_code)]

//! Error types shared by the download and convert workflows.
//!
//! `ValidationError` is always user-facing and maps to exit code 2. Everything
//! else travels through `anyhow` and maps to exit code 1.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No URLs were provided.")]
    NoUrls,

    #[error("Empty URL value(s) at position(s): {}", join_positions(.0))]
    EmptyUrls(Vec<usize>),

    #[error("Invalid URL(s): {}", .0.join(", "))]
    InvalidUrls(Vec<String>),

    #[error("Only YouTube URLs are supported. Invalid URL(s): {}", .0.join(", "))]
    UnsupportedUrls(Vec<String>),

    #[error("URL file not found: {}", .0.display())]
    UrlFileMissing(PathBuf),

    #[error("Video quality must be one of: auto, best, 2k, 1440p, fullhd, fhd, 1080p, hd, 720p (got {0:?}).")]
    VideoQuality(String),

    #[error("Audio quality must be between 64 and 320 kbps (got {0}).")]
    AudioQuality(i64),

    #[error("Audio quality must be a number between 64 and 320 (got {0:?}).")]
    AudioQualityNotNumber(String),

    #[error("Filename style must be one of: clean, clean-date (got {0:?}).")]
    FilenameStyle(String),

    #[error("Bitrate must look like 128k, 192k or 320k (got {0:?}).")]
    Bitrate(String),

    #[error("Input directory not found: {}", .0.display())]
    InputDirMissing(PathBuf),

    #[error("No .mp4 files found in {}", .0.display())]
    NoMp4Files(PathBuf),

    #[error("{0} is required but was not found in PATH.")]
    EncoderMissing(String),
}

fn join_positions(positions: &[usize]) -> String {
    positions
        .iter()
        .map(|pos| pos.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The engine's own download failure. The message is kept verbatim so that
/// callers and the history log see exactly what yt-dlp reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadError {
    message: String,
}

impl DownloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DownloadError {}

/// Failures reported by an `Extractor`. Only `Download` is eligible for the
/// next profile in the fallback chain.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("unable to run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("unable to run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed on {} (status {status})", .input.display())]
    Failed {
        program: String,
        input: PathBuf,
        status: std::process::ExitStatus,
    },
}

/// Exit code the command surface reports for an error.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ValidationError>().is_some() {
        2
    } else {
        1
    }
}
