#![forbid(unsafe_code)]

//! ffmpeg adapter used by the MP4 to MP3 conversion.

use crate::error::{EncoderError, ValidationError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

pub trait AudioEncoder {
    /// Fails with a user-facing error when the encoder cannot be started.
    fn ensure_available(&self) -> Result<(), ValidationError>;

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: &str,
        overwrite: bool,
    ) -> Result<(), EncoderError>;
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

impl AudioEncoder for Ffmpeg {
    fn ensure_available(&self) -> Result<(), ValidationError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(ValidationError::EncoderMissing(self.name())),
        }
    }

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: &str,
        overwrite: bool,
    ) -> Result<(), EncoderError> {
        let args = encode_args(input, output, bitrate, overwrite);
        debug!(program = %self.program.display(), input = %input.display(), "encoding to mp3");

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| EncoderError::Launch {
                program: self.name(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(EncoderError::Failed {
                program: self.name(),
                input: input.to_path_buf(),
                status,
            })
        }
    }
}

pub fn encode_args(input: &Path, output: &Path, bitrate: &str, overwrite: bool) -> Vec<String> {
    vec![
        if overwrite { "-y" } else { "-n" }.to_string(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vn".into(),
        "-acodec".into(),
        "libmp3lame".into(),
        "-ab".into(),
        bitrate.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}
