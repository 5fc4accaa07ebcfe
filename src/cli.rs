#![forbid(unsafe_code)]

//! Command surface shared by every binary. `run` parses the arguments,
//! dispatches to a workflow and turns the outcome into an exit code.

use crate::config::{RuntimeOverrides, RuntimePaths, resolve_runtime_paths};
use crate::convert::{ConvertRequest, DEFAULT_BITRATE, convert_mp4_to_mp3};
use crate::download::Downloader;
use crate::encoder::Ffmpeg;
use crate::engine::YtDlp;
use crate::error::{ValidationError, exit_code_for};
use crate::history::HistoryStore;
use crate::logging::init_logging;
use crate::menu::run_menu;
use crate::naming::FilenameStyle;
use crate::quality::{AudioQuality, DEFAULT_VIDEO_QUALITY, VideoQuality};
use crate::urls::{read_url_lines, validate_urls};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "tubegrab",
    version,
    about = "Download YouTube video or audio through yt-dlp and convert MP4 files to MP3"
)]
pub struct Cli {
    /// Downloads root holding the video, audio and video_to_audio folders.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Optional .env file with TUBEGRAB_* settings.
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,
    /// JSON history log (defaults to <root>/history.json).
    #[arg(long, global = true, value_name = "PATH")]
    history_file: Option<PathBuf>,
    #[arg(long = "yt-dlp", global = true, value_name = "PATH")]
    yt_dlp: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download videos as MP4.
    Video(VideoArgs),
    /// Download the audio track as MP3.
    Audio(AudioArgs),
    /// Download a video URL straight to MP3.
    VideoToAudio(AudioArgs),
    /// Convert local .mp4 files to .mp3 with ffmpeg.
    Convert(ConvertArgs),
    /// Open the interactive console menu.
    Menu,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// URL to download; repeat for several.
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,
    /// Text file with one URL per line (# starts a comment).
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// clean or clean-date.
    #[arg(long, default_value = "clean")]
    filename_style: String,
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct VideoArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// auto/best, 2k/1440p, fullhd/fhd/1080p or hd/720p.
    #[arg(long, default_value = DEFAULT_VIDEO_QUALITY)]
    video_quality: String,
}

#[derive(Debug, Args)]
struct AudioArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// MP3 bitrate in kbps, 64 to 320.
    #[arg(long, default_value = "192", allow_hyphen_values = true)]
    quality: String,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    #[arg(long, value_name = "DIR")]
    input_dir: PathBuf,
    #[arg(long)]
    overwrite: bool,
    #[arg(long)]
    recursive: bool,
    #[arg(long, default_value = DEFAULT_BITRATE)]
    bitrate: String,
}

/// Entry point for the binaries, wired to the process's stdin and stdout.
pub fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(args, &mut stdin.lock(), &mut stdout.lock())
}

pub fn run_with_io<I, T, R, W>(args: I, input: &mut R, out: &mut W) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: BufRead,
    W: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    match execute(cli, input, out) {
        Ok(code) => code,
        Err(err) => {
            if let Some(validation) = err.downcast_ref::<ValidationError>() {
                eprintln!("Input error: {validation}");
            } else {
                eprintln!("Runtime error: {err:#}");
            }
            exit_code_for(&err)
        }
    }
}

fn execute<R: BufRead, W: Write>(cli: Cli, input: &mut R, out: &mut W) -> Result<i32> {
    let paths = resolve_runtime_paths(RuntimeOverrides {
        downloads_root: cli.root,
        history_file: cli.history_file,
        yt_dlp_bin: cli.yt_dlp,
        ffmpeg_bin: cli.ffmpeg,
        env_path: cli.env_file,
    })?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Video(args) => {
            init_logging(args.source.verbose);
            let urls = collect_urls(&args.source)?;
            let quality = VideoQuality::parse(&args.video_quality)?;
            let style = FilenameStyle::parse(&args.source.filename_style)?;
            let output_dir = args.source.output_dir.unwrap_or_else(|| paths.video_dir());
            let count = downloader(&paths, args.source.verbose).video(
                &urls,
                &output_dir,
                &args.video_quality,
                quality,
                style,
            )?;
            writeln!(out, "Video download completed: {count} item(s).")?;
        }
        Command::Audio(args) => {
            init_logging(args.source.verbose);
            let (urls, quality, style) = audio_inputs(&args)?;
            let output_dir = args.source.output_dir.unwrap_or_else(|| paths.audio_dir());
            let count = downloader(&paths, args.source.verbose)
                .audio(&urls, &output_dir, quality, style)?;
            writeln!(out, "Audio download completed: {count} item(s).")?;
        }
        Command::VideoToAudio(args) => {
            init_logging(args.source.verbose);
            let (urls, quality, style) = audio_inputs(&args)?;
            let output_dir = args
                .source
                .output_dir
                .unwrap_or_else(|| paths.video_to_audio_dir());
            let count = downloader(&paths, args.source.verbose)
                .video_to_audio(&urls, &output_dir, quality, style)?;
            writeln!(out, "Video-to-audio completed: {count} item(s).")?;
        }
        Command::Convert(args) => {
            init_logging(false);
            let request = ConvertRequest {
                input_dir: args.input_dir,
                overwrite: args.overwrite,
                recursive: args.recursive,
                bitrate: args.bitrate,
            };
            let count = convert_mp4_to_mp3(&request, &Ffmpeg::new(&paths.ffmpeg_bin))?;
            writeln!(out, "Converted {count} file(s) to MP3.")?;
        }
        Command::Menu => {
            init_logging(false);
            return run_menu(&downloader(&paths, false), &paths, input, out);
        }
    }
    Ok(0)
}

fn downloader(paths: &RuntimePaths, verbose: bool) -> Downloader<YtDlp> {
    Downloader::new(
        YtDlp::new(&paths.yt_dlp_bin),
        HistoryStore::new(&paths.history_file),
        verbose,
    )
}

/// `--url` values first, then the URL file's lines, validated together.
fn collect_urls(source: &SourceArgs) -> Result<Vec<String>> {
    let mut urls = source.urls.clone();
    if let Some(path) = &source.urls_file {
        urls.extend(read_url_lines(path)?);
    }
    Ok(validate_urls(urls, true)?)
}

fn audio_inputs(args: &AudioArgs) -> Result<(Vec<String>, AudioQuality, FilenameStyle)> {
    let urls = collect_urls(&args.source)?;
    let quality = AudioQuality::parse(&args.quality)?;
    let style = FilenameStyle::parse(&args.source.filename_style)?;
    Ok((urls, quality, style))
}
