#![forbid(unsafe_code)]

//! Shortcut for `tubegrab video ...`.

use std::env;
use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args_os();
    let program = args.next().unwrap_or_else(|| OsString::from("download_videos"));
    let argv = [program, OsString::from("video")].into_iter().chain(args);
    let code = tubegrab::cli::run(argv);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
