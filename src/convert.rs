#![forbid(unsafe_code)]

use crate::encoder::AudioEncoder;
use crate::error::ValidationError;
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const DEFAULT_BITRATE: &str = "192k";

#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input_dir: PathBuf,
    pub overwrite: bool,
    pub recursive: bool,
    pub bitrate: String,
}

impl ConvertRequest {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            overwrite: false,
            recursive: false,
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }
}

/// Converts every `.mp4` under the input directory to an `.mp3` next to it.
///
/// Returns how many files were handed to the encoder. Existing MP3s are left
/// alone unless `overwrite` is set, and the first encoder failure stops the
/// batch.
pub fn convert_mp4_to_mp3<A: AudioEncoder + ?Sized>(
    request: &ConvertRequest,
    encoder: &A,
) -> Result<usize> {
    if !request.input_dir.is_dir() {
        return Err(ValidationError::InputDirMissing(request.input_dir.clone()).into());
    }
    validate_bitrate(&request.bitrate)?;
    encoder.ensure_available()?;

    let files = find_mp4_files(&request.input_dir, request.recursive)?;
    if files.is_empty() {
        return Err(ValidationError::NoMp4Files(request.input_dir.clone()).into());
    }

    let mut converted = 0;
    for input in &files {
        let output = input.with_extension("mp3");
        if output.exists() && !request.overwrite {
            debug!(file = %output.display(), "mp3 already exists, skipping");
            continue;
        }
        encoder
            .encode(input, &output, &request.bitrate, request.overwrite)
            .with_context(|| format!("converting {}", input.display()))?;
        converted += 1;
    }

    info!(converted, found = files.len(), "conversion finished");
    Ok(converted)
}

/// Accepts digits with an optional `k`/`K` suffix, the form ffmpeg's `-ab`
/// takes.
pub fn validate_bitrate(bitrate: &str) -> Result<(), ValidationError> {
    let digits = bitrate
        .strip_suffix(['k', 'K'])
        .unwrap_or(bitrate);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::Bitrate(bitrate.to_string()))
    }
}

fn find_mp4_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        // Symlinked clips count; `is_file` follows the link.
        let path = entry.path();
        if path.extension() == Some(OsStr::new("mp4")) && path.is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::testing::RecordingEncoder;
    use std::fs;
    use tempfile::tempdir;

    fn request(dir: &Path) -> ConvertRequest {
        ConvertRequest::new(dir)
    }

    #[test]
    fn single_clip_is_converted_once() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("clip.mp4"), b"video")?;
        let encoder = RecordingEncoder::default();

        let count = convert_mp4_to_mp3(&request(dir.path()), &encoder)?;
        assert_eq!(count, 1);
        let calls = encoder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, dir.path().join("clip.mp4"));
        assert_eq!(calls[0].1, dir.path().join("clip.mp3"));
        assert_eq!(calls[0].2, "192k");
        assert!(!calls[0].3);
        Ok(())
    }

    #[test]
    fn existing_mp3_is_skipped_without_overwrite() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("clip.mp4"), b"video")?;
        fs::write(dir.path().join("clip.mp3"), b"audio")?;
        let encoder = RecordingEncoder::default();

        let count = convert_mp4_to_mp3(&request(dir.path()), &encoder)?;
        assert_eq!(count, 0);
        assert_eq!(encoder.call_count(), 0);
        Ok(())
    }

    #[test]
    fn overwrite_reencodes_existing_mp3() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("clip.mp4"), b"video")?;
        fs::write(dir.path().join("clip.mp3"), b"audio")?;
        let encoder = RecordingEncoder::default();
        let req = ConvertRequest {
            overwrite: true,
            ..request(dir.path())
        };

        assert_eq!(convert_mp4_to_mp3(&req, &encoder)?, 1);
        assert!(encoder.calls.borrow()[0].3);
        Ok(())
    }

    #[test]
    fn empty_directory_is_an_input_error() -> Result<()> {
        let dir = tempdir()?;
        let encoder = RecordingEncoder::default();
        let err = convert_mp4_to_mp3(&request(dir.path()), &encoder).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoMp4Files(dir.path().to_path_buf()))
        );
        assert_eq!(encoder.call_count(), 0);
        Ok(())
    }

    #[test]
    fn missing_directory_and_encoder_are_input_errors() -> Result<()> {
        let dir = tempdir()?;
        let encoder = RecordingEncoder::default();
        let err = convert_mp4_to_mp3(&request(&dir.path().join("nope")), &encoder).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InputDirMissing(_))
        ));

        fs::write(dir.path().join("clip.mp4"), b"video")?;
        let missing = RecordingEncoder {
            missing: true,
            ..RecordingEncoder::default()
        };
        let err = convert_mp4_to_mp3(&request(dir.path()), &missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::EncoderMissing(_))
        ));
        assert_eq!(missing.call_count(), 0);
        Ok(())
    }

    #[test]
    fn recursion_and_suffix_rules() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("sub"))?;
        fs::write(dir.path().join("b.mp4"), b"")?;
        fs::write(dir.path().join("a.mp4"), b"")?;
        fs::write(dir.path().join("upper.MP4"), b"")?;
        fs::write(dir.path().join("notes.txt"), b"")?;
        fs::write(dir.path().join("sub/c.mp4"), b"")?;

        let encoder = RecordingEncoder::default();
        assert_eq!(convert_mp4_to_mp3(&request(dir.path()), &encoder)?, 2);
        let inputs: Vec<PathBuf> = encoder.calls.borrow().iter().map(|c| c.0.clone()).collect();
        assert_eq!(
            inputs,
            vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")]
        );

        let encoder = RecordingEncoder::default();
        let req = ConvertRequest {
            recursive: true,
            ..request(dir.path())
        };
        assert_eq!(convert_mp4_to_mp3(&req, &encoder)?, 3);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_clips_are_converted() -> Result<()> {
        let dir = tempdir()?;
        let media = dir.path().join("media");
        fs::create_dir(&media)?;
        fs::write(dir.path().join("real.mp4"), b"video")?;
        std::os::unix::fs::symlink(dir.path().join("real.mp4"), media.join("linked.mp4"))?;
        std::os::unix::fs::symlink(dir.path().join("gone.mp4"), media.join("dangling.mp4"))?;

        let encoder = RecordingEncoder::default();
        assert_eq!(convert_mp4_to_mp3(&request(&media), &encoder)?, 1);
        assert_eq!(encoder.calls.borrow()[0].0, media.join("linked.mp4"));
        assert_eq!(encoder.calls.borrow()[0].1, media.join("linked.mp3"));
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_converted() -> Result<()> {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir()?;
        let name = OsStr::from_bytes(b"clip-\xff.mp4");
        fs::write(dir.path().join(name), b"video")?;

        let encoder = RecordingEncoder::default();
        assert_eq!(convert_mp4_to_mp3(&request(dir.path()), &encoder)?, 1);
        assert_eq!(encoder.calls.borrow()[0].0, dir.path().join(name));
        assert_eq!(
            encoder.calls.borrow()[0].1,
            dir.path().join(OsStr::from_bytes(b"clip-\xff.mp3"))
        );
        Ok(())
    }

    #[test]
    fn encoder_failure_stops_the_batch() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.mp4"), b"")?;
        fs::write(dir.path().join("b.mp4"), b"")?;
        let encoder = RecordingEncoder {
            fail: true,
            ..RecordingEncoder::default()
        };
        let err = convert_mp4_to_mp3(&request(dir.path()), &encoder).unwrap_err();
        assert_eq!(encoder.call_count(), 1);
        assert!(err.downcast_ref::<ValidationError>().is_none());
        Ok(())
    }

    #[test]
    fn bitrate_must_be_digits_with_optional_k() {
        for ok in ["128k", "192K", "320k", "96"] {
            assert!(validate_bitrate(ok).is_ok(), "{ok}");
        }
        for bad in ["", "k", "fast", "192kb", "-1k", "19 2k"] {
            assert_eq!(
                validate_bitrate(bad),
                Err(ValidationError::Bitrate(bad.to_string()))
            );
        }
    }

    #[test]
    fn bad_bitrate_is_rejected_before_encoding() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("clip.mp4"), b"")?;
        let encoder = RecordingEncoder::default();
        let req = ConvertRequest {
            bitrate: "loud".into(),
            ..request(dir.path())
        };
        let err = convert_mp4_to_mp3(&req, &encoder).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert_eq!(encoder.call_count(), 0);
        Ok(())
    }
}
