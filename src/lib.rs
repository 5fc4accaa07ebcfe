#![forbid(unsafe_code)]

//! Download YouTube video or audio through yt-dlp, convert local MP4 files to
//! MP3 through ffmpeg, and keep a JSON history of every download attempt.

pub mod cli;
pub mod config;
pub mod convert;
pub mod download;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod history;
pub mod invoker;
pub mod logging;
pub mod media_info;
pub mod menu;
pub mod naming;
pub mod profile;
pub mod quality;
pub mod urls;
