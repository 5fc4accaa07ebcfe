#![forbid(unsafe_code)]

//! The three download workflows. Each URL is attempted in order and recorded
//! in the history before the next one starts; the first failure ends the run.

use crate::engine::Extractor;
use crate::history::{HistoryEntry, HistoryStore, Mode, RecordedQuality};
use crate::invoker::download_with_fallback;
use crate::naming::FilenameStyle;
use crate::profile::DownloadPlan;
use crate::quality::{AudioQuality, VideoQuality};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub struct Downloader<E: Extractor> {
    extractor: E,
    history: HistoryStore,
    verbose: bool,
}

impl<E: Extractor> Downloader<E> {
    pub fn new(extractor: E, history: HistoryStore, verbose: bool) -> Self {
        Self {
            extractor,
            history,
            verbose,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// `quality_token` is recorded as given; `quality` is its parsed form.
    pub fn video(
        &self,
        urls: &[String],
        output_dir: &Path,
        quality_token: &str,
        quality: VideoQuality,
        style: FilenameStyle,
    ) -> Result<usize> {
        self.run(
            Mode::Video,
            urls,
            output_dir,
            &DownloadPlan::video(quality),
            &RecordedQuality::Video(quality_token.to_string()),
            style,
        )
    }

    pub fn audio(
        &self,
        urls: &[String],
        output_dir: &Path,
        quality: AudioQuality,
        style: FilenameStyle,
    ) -> Result<usize> {
        self.run(
            Mode::Audio,
            urls,
            output_dir,
            &DownloadPlan::audio(quality),
            &RecordedQuality::AudioKbps(quality.kbps()),
            style,
        )
    }

    /// Same engine settings as `audio`; kept apart so the history and output
    /// directory tell the two workflows apart.
    pub fn video_to_audio(
        &self,
        urls: &[String],
        output_dir: &Path,
        quality: AudioQuality,
        style: FilenameStyle,
    ) -> Result<usize> {
        self.run(
            Mode::VideoToAudio,
            urls,
            output_dir,
            &DownloadPlan::audio(quality),
            &RecordedQuality::AudioKbps(quality.kbps()),
            style,
        )
    }

    fn run(
        &self,
        mode: Mode,
        urls: &[String],
        output_dir: &Path,
        plan: &DownloadPlan,
        quality: &RecordedQuality,
        style: FilenameStyle,
    ) -> Result<usize> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;

        let mut completed = 0;
        for url in urls {
            match download_with_fallback(
                &self.extractor,
                url,
                plan,
                output_dir,
                style,
                self.verbose,
            ) {
                Ok(info) => {
                    self.history.append(HistoryEntry::success(
                        mode, url, output_dir, style, quality, &info,
                    ))?;
                    completed += 1;
                }
                Err(err) => {
                    self.history.append(HistoryEntry::failure(
                        mode,
                        url,
                        output_dir,
                        style,
                        quality,
                        &err.to_string(),
                    ))?;
                    return Err(err);
                }
            }
        }

        info!(?mode, completed, dir = %output_dir.display(), "downloads finished");
        Ok(completed)
    }
}
