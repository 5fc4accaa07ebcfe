#![forbid(unsafe_code)]

//! Adapter around the yt-dlp binary. Each `EngineRequest` becomes one
//! blocking yt-dlp invocation whose final JSON line is the result metadata.

use crate::error::{DownloadError, EngineError};
use crate::media_info::MediaInfo;
use crate::profile::{PlayerClient, PostProcess};
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, warn};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Everything one attempt needs. Built by the invoker from a profile and the
/// plan it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub format: String,
    pub player_client: PlayerClient,
    pub output_template: String,
    pub allow_playlist: bool,
    pub merge_output_format: Option<&'static str>,
    pub post_process: PostProcess,
    pub user_agent: &'static str,
    pub restrict_filenames: bool,
    pub verbose: bool,
}

pub trait Extractor {
    /// Downloads `url`. A failure reported by the engine itself is
    /// `EngineError::Download`; anything else means the engine never ran.
    fn extract(&self, url: &str, request: &EngineRequest) -> Result<MediaInfo, EngineError>;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }
}

impl Extractor for YtDlp {
    fn extract(&self, url: &str, request: &EngineRequest) -> Result<MediaInfo, EngineError> {
        let args = build_args(url, request);
        debug!(program = %self.program.display(), ?args, "running yt-dlp");

        let output = self
            .command()
            .args(&args)
            .output()
            .map_err(|source| EngineError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if request.verbose && !stderr.trim().is_empty() {
            eprint!("{stderr}");
        }

        if !output.status.success() {
            return Err(download_error_from(&output).into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_info_output(&stdout).unwrap_or_else(|| {
            warn!(%url, "yt-dlp succeeded without printing metadata");
            MediaInfo::default()
        }))
    }
}

/// Command line for one attempt. The URL always comes last, after `--`.
pub fn build_args(url: &str, request: &EngineRequest) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--dump-single-json".into(),
        "--no-simulate".into(),
        "--no-progress".into(),
        if request.verbose { "--verbose" } else { "--quiet" }.into(),
        "--format".into(),
        request.format.clone(),
        "--extractor-args".into(),
        format!("youtube:player_client={}", request.player_client.as_str()),
        "--output".into(),
        request.output_template.clone(),
    ];

    if request.restrict_filenames {
        args.push("--restrict-filenames".into());
        args.push("--windows-filenames".into());
    }
    args.push("--add-header".into());
    args.push(format!("User-Agent:{}", request.user_agent));

    args.push(
        if request.allow_playlist {
            "--yes-playlist"
        } else {
            "--no-playlist"
        }
        .into(),
    );

    if let Some(container) = request.merge_output_format {
        args.push("--merge-output-format".into());
        args.push(container.into());
    }

    if let PostProcess::ExtractMp3 { kbps } = request.post_process {
        args.push("--extract-audio".into());
        args.push("--audio-format".into());
        args.push("mp3".into());
        args.push("--audio-quality".into());
        args.push(format!("{kbps}K"));
    }

    args.push("--".into());
    args.push(url.to_string());
    args
}

/// yt-dlp may print log lines around the JSON document; the metadata is the
/// last line that parses as an object.
pub fn parse_info_output(stdout: &str) -> Option<MediaInfo> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<MediaInfo>(line).ok())
}

/// Picks the engine's own `ERROR:` line so the message matches what yt-dlp
/// reported, falling back to the last stderr line or the exit status.
fn download_error_from(output: &Output) -> DownloadError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let message = lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
    DownloadError::new(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn sample_request() -> EngineRequest {
        EngineRequest {
            format: "bestaudio/best".into(),
            player_client: PlayerClient::Android,
            output_template: "/out/%(title).180B.%(ext)s".into(),
            allow_playlist: false,
            merge_output_format: None,
            post_process: PostProcess::ExtractMp3 { kbps: 192 },
            user_agent: BROWSER_USER_AGENT,
            restrict_filenames: true,
            verbose: false,
        }
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|index| args.get(index + 1))
            .cloned()
    }

    #[test]
    fn audio_request_maps_to_extract_audio_flags() {
        let args = build_args("https://youtu.be/abc", &sample_request());
        assert_eq!(value_after(&args, "--format").as_deref(), Some("bestaudio/best"));
        assert_eq!(
            value_after(&args, "--extractor-args").as_deref(),
            Some("youtube:player_client=android")
        );
        assert_eq!(value_after(&args, "--audio-format").as_deref(), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality").as_deref(), Some("192K"));
        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--quiet".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "https://youtu.be/abc");
    }

    #[test]
    fn video_request_merges_into_mp4_and_follows_playlists() {
        let request = EngineRequest {
            format: "best[ext=mp4]/best".into(),
            player_client: PlayerClient::Default,
            allow_playlist: true,
            merge_output_format: Some("mp4"),
            post_process: PostProcess::None,
            verbose: true,
            ..sample_request()
        };
        let args = build_args("https://youtu.be/abc", &request);
        assert_eq!(
            value_after(&args, "--merge-output-format").as_deref(),
            Some("mp4")
        );
        assert!(args.contains(&"--yes-playlist".to_string()));
        assert!(args.contains(&"--verbose".to_string()));
        assert!(!args.contains(&"--extract-audio".to_string()));
    }

    #[test]
    fn every_request_sets_user_agent_and_safe_filenames() {
        let args = build_args("https://youtu.be/abc", &sample_request());
        assert_eq!(
            value_after(&args, "--add-header"),
            Some(format!("User-Agent:{BROWSER_USER_AGENT}"))
        );
        assert!(args.contains(&"--restrict-filenames".to_string()));
        assert!(args.contains(&"--windows-filenames".to_string()));
        assert_eq!(
            value_after(&args, "--output").as_deref(),
            Some("/out/%(title).180B.%(ext)s")
        );
    }

    #[test]
    fn parse_info_output_takes_last_json_line() {
        let stdout = "[info] noise\n{\"id\": \"first\"}\nDeleting original file\n{\"id\": \"abc\", \"title\": \"T\"}\n";
        let info = parse_info_output(stdout).unwrap();
        assert_eq!(info.id.as_deref(), Some("abc"));
        assert!(parse_info_output("no json here\n").is_none());
    }

    fn install_stub(dir: &Path, body: &str) -> Result<PathBuf> {
        let script_path = dir.join("yt-dlp");
        fs::write(&script_path, format!("#!/usr/bin/env bash\n{body}\n"))?;
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&script_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script_path, perms)?;
        }
        Ok(script_path)
    }

    #[cfg(unix)]
    #[test]
    fn stub_success_returns_metadata() -> Result<()> {
        let dir = tempdir()?;
        let stub = install_stub(
            dir.path(),
            r#"echo "[youtube] extracting" >&2
echo '{"id": "alpha", "title": "Alpha Title", "requested_downloads": [{"filepath": "/out/Alpha_Title.m4a"}]}'"#,
        )?;
        let info = YtDlp::new(stub).extract("https://youtu.be/alpha", &sample_request())?;
        assert_eq!(info.id.as_deref(), Some("alpha"));
        assert_eq!(
            info.output_path(Some("mp3")),
            Some(PathBuf::from("/out/Alpha_Title.mp3"))
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn stub_receives_url_last() -> Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("args.log");
        let stub = install_stub(
            dir.path(),
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\necho '{{}}'",
                log.display()
            ),
        )?;
        YtDlp::new(stub).extract("https://youtu.be/alpha", &sample_request())?;
        let logged = fs::read_to_string(&log)?;
        let lines: Vec<&str> = logged.lines().collect();
        assert_eq!(lines.first().copied(), Some("--dump-single-json"));
        assert_eq!(lines.last().copied(), Some("https://youtu.be/alpha"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn stub_failure_surfaces_error_line_verbatim() -> Result<()> {
        let dir = tempdir()?;
        let stub = install_stub(
            dir.path(),
            r#"echo "WARNING: something odd" >&2
echo "ERROR: [youtube] alpha: Video unavailable" >&2
exit 1"#,
        )?;
        let err = YtDlp::new(stub)
            .extract("https://youtu.be/alpha", &sample_request())
            .unwrap_err();
        match err {
            EngineError::Download(inner) => {
                assert_eq!(inner.message(), "ERROR: [youtube] alpha: Video unavailable")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn silent_failure_reports_exit_status() -> Result<()> {
        let dir = tempdir()?;
        let stub = install_stub(dir.path(), "exit 3")?;
        let err = YtDlp::new(stub)
            .extract("https://youtu.be/alpha", &sample_request())
            .unwrap_err();
        assert!(err.to_string().starts_with("yt-dlp exited with"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn success_without_json_yields_empty_metadata() -> Result<()> {
        let dir = tempdir()?;
        let stub = install_stub(dir.path(), "exit 0")?;
        let info = YtDlp::new(stub).extract("https://youtu.be/alpha", &sample_request())?;
        assert_eq!(info, MediaInfo::default());
        Ok(())
    }

    #[test]
    fn missing_binary_is_a_launch_error() {
        let dir = tempdir().unwrap();
        let err = YtDlp::new(dir.path().join("does-not-exist"))
            .extract("https://youtu.be/alpha", &sample_request())
            .unwrap_err();
        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
