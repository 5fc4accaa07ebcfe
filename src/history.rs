#![forbid(unsafe_code)]

//! Append-only download history.
//!
//! The log is a single JSON array rewritten in full on every append. There is
//! no locking: two processes appending at once can lose an entry.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::media_info::MediaInfo;
use crate::naming::FilenameStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Video,
    Audio,
    VideoToAudio,
}

impl Mode {
    /// Extension post-processing guarantees for this mode's output.
    pub fn forced_extension(self) -> &'static str {
        match self {
            Mode::Video => "mp4",
            Mode::Audio | Mode::VideoToAudio => "mp3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp_utc: String,
    pub mode: Mode,
    pub url: String,
    pub status: Status,
    pub output_dir: String,
    pub filename_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_quality_kbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// Quality settings recorded alongside an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedQuality {
    Video(String),
    AudioKbps(u32),
}

impl HistoryEntry {
    fn base(
        mode: Mode,
        url: &str,
        status: Status,
        output_dir: &Path,
        style: FilenameStyle,
        quality: &RecordedQuality,
    ) -> Self {
        let (video_quality, audio_quality_kbps) = match quality {
            RecordedQuality::Video(token) => (Some(token.clone()), None),
            RecordedQuality::AudioKbps(kbps) => (None, Some(*kbps)),
        };
        Self {
            timestamp_utc: Utc::now().to_rfc3339(),
            mode,
            url: url.to_string(),
            status,
            output_dir: output_dir.to_string_lossy().into_owned(),
            filename_style: style.as_str().to_string(),
            video_quality,
            audio_quality_kbps,
            error: None,
            video_id: None,
            title: None,
            output_file: None,
        }
    }

    pub fn success(
        mode: Mode,
        url: &str,
        output_dir: &Path,
        style: FilenameStyle,
        quality: &RecordedQuality,
        info: &MediaInfo,
    ) -> Self {
        let mut entry = Self::base(mode, url, Status::Success, output_dir, style, quality);
        entry.video_id = info.id.clone();
        entry.title = info.title.clone();
        entry.output_file = info
            .output_path(Some(mode.forced_extension()))
            .map(|path| path.to_string_lossy().into_owned());
        entry
    }

    pub fn failure(
        mode: Mode,
        url: &str,
        output_dir: &Path,
        style: FilenameStyle,
        quality: &RecordedQuality,
        error: &str,
    ) -> Self {
        let mut entry = Self::base(mode, url, Status::Failed, output_dir, style, quality);
        if !error.is_empty() {
            entry.error = Some(error.to_string());
        }
        entry
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every well-formed entry, oldest first. Elements this version cannot
    /// read are left out of the view but stay in the file.
    pub fn read_all(&self) -> Vec<HistoryEntry> {
        let raw = match self.read_raw() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %self.path.display(), error = %format!("{err:#}"), "history is unreadable");
                return Vec::new();
            }
        };
        raw.into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    /// The stored array exactly as written. A missing file, invalid JSON or a
    /// non-array document reads as empty; any other read failure is an error.
    pub fn read_raw(&self) -> Result<Vec<Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => {
                warn!(path = %self.path.display(), "history file is not a JSON array, starting a new one");
                Ok(Vec::new())
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "history file is not valid JSON, starting a new one");
                Ok(Vec::new())
            }
        }
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut entries = self.read_raw()?;
        entries.push(serde_json::to_value(&entry).context("serializing history entry")?);
        let payload = to_ascii_pretty_json(&entries)?;
        fs::write(&self.path, payload)
            .with_context(|| format!("writing {}", self.path.display()))?;
        debug!(path = %self.path.display(), total = entries.len(), "history updated");
        Ok(())
    }
}

/// Two-space indented JSON with every non-ASCII character escaped as
/// `\uXXXX` (surrogate pairs above the BMP).
fn to_ascii_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, AsciiFormatter(PrettyFormatter::new()));
    value
        .serialize(&mut serializer)
        .context("serializing history")?;
    Ok(out)
}

struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
