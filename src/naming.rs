#![forbid(unsafe_code)]

use crate::error::ValidationError;
use std::fmt;
use std::path::Path;

const CLEAN_TEMPLATE: &str = "%(title).180B.%(ext)s";
const CLEAN_DATE_TEMPLATE: &str = "%(upload_date>%Y%m%d)s-%(title).180B.%(ext)s";

/// How downloaded files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStyle {
    #[default]
    Clean,
    /// Prefixes the title with the upload date as `YYYYMMDD-`.
    CleanDate,
}

impl FilenameStyle {
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(Self::Clean),
            "clean-date" | "date" => Ok(Self::CleanDate),
            _ => Err(ValidationError::FilenameStyle(token.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::CleanDate => "clean-date",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Clean => CLEAN_TEMPLATE,
            Self::CleanDate => CLEAN_DATE_TEMPLATE,
        }
    }

    /// yt-dlp output template rooted at `output_dir`.
    pub fn output_template(self, output_dir: &Path) -> String {
        output_dir.join(self.template()).to_string_lossy().into_owned()
    }
}

impl fmt::Display for FilenameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
