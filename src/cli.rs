use crate::constants::{CONFIG_FILE_NAME, MAX_SEG_SIZE_MB, MIN_SEG_SIZE_MB};
use clap::{value_parser, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Without a subcommand the interactive menu is started.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file holding the part size and last selections.
    #[arg(long, global = true, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set.
    #[arg(long = "log-level", global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a file into numbered parts next to it (<FILE>.part1, <FILE>.part2, ...).
    Split(SplitArgs),
    /// Rebuild a file from its parts.
    Merge(MergeArgs),
    /// Interactive console menu.
    Menu,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// File to split.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Part size in MB (1 MB = 1,048,576 bytes). Defaults to the configured size.
    #[arg(
        long,
        value_name = "MB",
        value_parser = value_parser!(u32).range(i64::from(MIN_SEG_SIZE_MB)..=i64::from(MAX_SEG_SIZE_MB))
    )]
    pub size: Option<u32>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Any part of the set (e.g. movie.mkv.part3), or the original file name.
    #[arg(value_name = "PART")]
    pub part: PathBuf,

    /// Output file. A relative path is placed under the parts directory; defaults to the original name.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}
