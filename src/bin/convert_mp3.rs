#![forbid(unsafe_code)]

//! Shortcut for `tubegrab convert ...`.

use std::env;
use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args_os();
    let program = args.next().unwrap_or_else(|| OsString::from("convert_mp3"));
    let argv = [program, OsString::from("convert")].into_iter().chain(args);
    let code = tubegrab::cli::run(argv);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
