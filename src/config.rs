#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_DOWNLOADS_ROOT: &str = "downloads";
pub const DEFAULT_HISTORY_FILE: &str = "history.json";
pub const DEFAULT_YT_DLP_BIN: &str = "yt-dlp";
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

const VIDEO_SUBDIR: &str = "video";
const AUDIO_SUBDIR: &str = "audio";
const VIDEO_TO_AUDIO_SUBDIR: &str = "video_to_audio";

/// Where downloads and history live, and which external binaries to run.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub downloads_root: PathBuf,
    pub history_file: PathBuf,
    pub yt_dlp_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
}

impl RuntimePaths {
    pub fn video_dir(&self) -> PathBuf {
        self.downloads_root.join(VIDEO_SUBDIR)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.downloads_root.join(AUDIO_SUBDIR)
    }

    pub fn video_to_audio_dir(&self) -> PathBuf {
        self.downloads_root.join(VIDEO_TO_AUDIO_SUBDIR)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub downloads_root: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub yt_dlp_bin: Option<PathBuf>,
    pub ffmpeg_bin: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_paths(overrides: RuntimeOverrides) -> Result<RuntimePaths> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_runtime_paths_with_overrides(
        &file_vars,
        env_var_string,
        overrides,
    ))
}

#[cfg(test)]
fn build_runtime_paths(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> RuntimePaths {
    build_runtime_paths_with_overrides(file_vars, env_lookup, RuntimeOverrides::default())
}

fn build_runtime_paths_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimePaths {
    let downloads_root = overrides
        .downloads_root
        .or_else(|| lookup_value("TUBEGRAB_ROOT", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_ROOT));
    // The history log sits beneath the downloads root unless pointed elsewhere.
    let history_file = overrides
        .history_file
        .or_else(|| lookup_value("TUBEGRAB_HISTORY", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| downloads_root.join(DEFAULT_HISTORY_FILE));
    let yt_dlp_bin = overrides
        .yt_dlp_bin
        .or_else(|| lookup_value("YT_DLP_BIN", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YT_DLP_BIN));
    let ffmpeg_bin = overrides
        .ffmpeg_bin
        .or_else(|| lookup_value("FFMPEG_BIN", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_BIN));

    RuntimePaths {
        downloads_root,
        history_file,
        yt_dlp_bin,
        ffmpeg_bin,
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
