#![forbid(unsafe_code)]

//! Interactive console menu: one download per session, driven by prompts.

use crate::config::RuntimePaths;
use crate::download::Downloader;
use crate::engine::Extractor;
use crate::naming::FilenameStyle;
use crate::quality::{AudioQuality, VideoQuality};
use crate::urls::validate_urls;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const MENU_DEFAULT_VIDEO_QUALITY: &str = "fullhd";
const MENU_DEFAULT_AUDIO_QUALITY: &str = "192";

/// Returns the process exit code: 0 on success or exit, 2 for an unknown
/// option. Validation and download failures are returned as errors.
pub fn run_menu<E, R, W>(
    downloader: &Downloader<E>,
    paths: &RuntimePaths,
    input: &mut R,
    out: &mut W,
) -> Result<i32>
where
    E: Extractor,
    R: BufRead,
    W: Write,
{
    writeln!(out, "=== tubegrab ===")?;
    writeln!(out, "1) Download video (MP4)")?;
    writeln!(out, "2) Download audio (MP3)")?;
    writeln!(out, "3) Convert video URL to audio (MP3)")?;
    writeln!(out, "0) Exit")?;

    let option = prompt(input, out, "Select an option: ", None)?;
    let default_dir = match option.as_str() {
        "0" => {
            writeln!(out, "Goodbye.")?;
            return Ok(0);
        }
        "1" => paths.video_dir(),
        "2" => paths.audio_dir(),
        "3" => paths.video_to_audio_dir(),
        _ => {
            writeln!(out, "Invalid option.")?;
            return Ok(2);
        }
    };

    let url = prompt(input, out, "Paste the URL: ", None)?;
    let urls = validate_urls([url], true)?;

    let default_dir = default_dir.to_string_lossy().into_owned();
    let dir_label = format!("Output directory [{default_dir}]: ");
    let output_dir = PathBuf::from(prompt(input, out, &dir_label, Some(default_dir.as_str()))?);

    let style = FilenameStyle::default();
    if option == "1" {
        let token = prompt(
            input,
            out,
            "Video quality [2k/fullhd/720p/auto, default fullhd]: ",
            Some(MENU_DEFAULT_VIDEO_QUALITY),
        )?;
        let quality = VideoQuality::parse(&token)?;
        let count = downloader.video(&urls, &output_dir, &token, quality, style)?;
        writeln!(out, "Video download completed: {count} item(s).")?;
        return Ok(0);
    }

    let token = prompt(
        input,
        out,
        "MP3 quality 64-320 [192]: ",
        Some(MENU_DEFAULT_AUDIO_QUALITY),
    )?;
    let quality = AudioQuality::parse(&token)?;
    if option == "2" {
        let count = downloader.audio(&urls, &output_dir, quality, style)?;
        writeln!(out, "Audio download completed: {count} item(s).")?;
    } else {
        let count = downloader.video_to_audio(&urls, &output_dir, quality, style)?;
        writeln!(out, "Video-to-audio completed: {count} item(s).")?;
    }
    Ok(0)
}

/// Reads one trimmed line; blank input (or end of input) yields the default.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: Option<&str>,
) -> Result<String> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading menu input")?;
    let value = line.trim();
    if value.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(value.to_string())
    }
}
