#![forbid(unsafe_code)]

//! Syntactic URL checks. Nothing here touches the network.

use crate::error::ValidationError;
use anyhow::Context;
use std::fs;
use std::path::Path;
use url::Url;

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
    "www.youtu.be",
];

const CONTENT_PATH_PREFIXES: &[&str] = &["/shorts/", "/live/", "/playlist"];

/// Trims every input and rejects the batch if any value is blank, lacks an
/// `http(s)://` scheme or, when `youtube_only` is set, does not look like a
/// YouTube item.
pub fn validate_urls<I, S>(inputs: I, youtube_only: bool) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned = Vec::new();
    let mut empty = Vec::new();
    for (index, raw) in inputs.into_iter().enumerate() {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            empty.push(index + 1);
        } else {
            cleaned.push(trimmed.to_string());
        }
    }

    if cleaned.is_empty() && empty.is_empty() {
        return Err(ValidationError::NoUrls);
    }
    if !empty.is_empty() {
        return Err(ValidationError::EmptyUrls(empty));
    }

    let invalid: Vec<String> = cleaned
        .iter()
        .filter(|url| !has_http_scheme(url))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::InvalidUrls(invalid));
    }

    if youtube_only {
        let unsupported: Vec<String> = cleaned
            .iter()
            .filter(|url| !is_youtube_url(url))
            .cloned()
            .collect();
        if !unsupported.is_empty() {
            return Err(ValidationError::UnsupportedUrls(unsupported));
        }
    }

    Ok(cleaned)
}

/// Reads one URL per line, skipping blanks and `#` comments, then validates the
/// result in YouTube-only mode.
pub fn read_urls_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let urls = read_url_lines(path)?;
    Ok(validate_urls(urls, true)?)
}

/// The non-comment lines of a URL file, trimmed and unvalidated.
pub fn read_url_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    if !path.exists() {
        return Err(ValidationError::UrlFileMissing(path.to_path_buf()).into());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn has_http_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

pub fn is_youtube_url(value: &str) -> bool {
    let Ok(parsed) = Url::parse(value) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return false;
    }
    // The whole authority must be one of the known hosts: no port, no userinfo.
    if parsed.port().is_some() || !parsed.username().is_empty() || parsed.password().is_some() {
        return false;
    }

    let path = parsed.path();
    if host.ends_with("youtu.be") {
        return !path.trim_matches('/').is_empty();
    }

    if path.starts_with("/watch") {
        return parsed
            .query_pairs()
            .any(|(key, value)| key == "v" && !value.is_empty());
    }

    CONTENT_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}
