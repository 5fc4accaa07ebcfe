#![forbid(unsafe_code)]

use serde::Deserialize;
use std::path::PathBuf;

/// Subset of yt-dlp's `--dump-single-json` payload that the history log reads.
/// Every field is optional; playlist results carry their items in `entries`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default, rename = "_filename")]
    pub filename: Option<String>,
    #[serde(default)]
    pub requested_downloads: Option<Vec<RequestedDownload>>,
    /// Entries may be `null` when yt-dlp could not resolve an item.
    #[serde(default)]
    pub entries: Option<Vec<Option<MediaInfo>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestedDownload {
    #[serde(default)]
    pub filepath: Option<String>,
}

impl MediaInfo {
    /// Final file path with its extension replaced by `force_ext` (given
    /// without the leading dot). Playlist results resolve through their first
    /// entry.
    pub fn output_path(&self, force_ext: Option<&str>) -> Option<PathBuf> {
        if let Some(entries) = &self.entries
            && let Some(Some(first)) = entries.first()
            && let Some(nested) = first.output_path(force_ext)
        {
            return Some(nested);
        }

        let candidate = self
            .filepath
            .iter()
            .chain(self.filename.iter())
            .chain(
                self.requested_downloads
                    .iter()
                    .flatten()
                    .filter_map(|item| item.filepath.as_ref()),
            )
            .find(|value| !value.is_empty())?;

        let mut path = PathBuf::from(candidate);
        if let Some(ext) = force_ext {
            path.set_extension(ext);
        }
        Some(path)
    }
}
