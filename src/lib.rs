pub mod atomic;
pub mod cli;
pub mod constants;
pub mod job;
pub mod menu;
pub mod merge;
pub mod naming;
pub mod settings;
pub mod split;

use clap::Parser;
use cli::{Cli, Commands, LogLevel};
use menu::{Menu, MenuError};
use merge::{MergeError, MergeRequest};
use settings::{Settings, SettingsError};
use split::{SegmentSize, SplitError, SplitRequest};
use std::io;
use tracing::level_filters::LevelFilter;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum AppError {
    Settings(SettingsError),
    Split(SplitError),
    Merge(MergeError),
    Menu(MenuError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Settings(err) => write!(f, "{err}"),
            AppError::Split(err) => write!(f, "{err}"),
            AppError::Merge(err) => write!(f, "{err}"),
            AppError::Menu(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Settings(err) => Some(err),
            AppError::Split(err) => Some(err),
            AppError::Merge(err) => Some(err),
            AppError::Menu(err) => Some(err),
        }
    }
}

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    let settings = Settings::load_or_create(&cli.config).map_err(AppError::Settings)?;

    match cli.command {
        Some(Commands::Split(args)) => {
            let segment = match args.size {
                Some(mb) => SegmentSize::from_megabytes(mb).unwrap_or_default(),
                None => settings.segment_size(),
            };
            let request = SplitRequest {
                source: args.file,
                segment,
            };
            let plan = split::plan(&request.source, segment).map_err(AppError::Split)?;
            if plan.smaller_than_segment() {
                warn!(
                    "{} is smaller than one part ({} < {} bytes), writing a single part",
                    request.source.display(),
                    plan.file_len,
                    plan.segment_bytes
                );
            }
            split::execute(&request)
                .map(|outcome| {
                    for part in &outcome.parts {
                        println!("{}", part.display());
                    }
                    println!("{}", outcome.summary());
                })
                .map_err(AppError::Split)
        }
        Some(Commands::Merge(args)) => {
            let request = MergeRequest::from(args);
            merge::execute(&request)
                .map(|outcome| {
                    for part in &outcome.parts {
                        println!("{}", part.display());
                    }
                    println!("Merged into {}", outcome.output_path.display());
                })
                .map_err(AppError::Merge)
        }
        Some(Commands::Menu) | None => {
            let stdin = io::stdin();
            let mut menu = Menu::new(stdin.lock(), io::stdout(), settings, cli.config);
            menu.run().map_err(AppError::Menu)
        }
    }
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(Level::from(level)).into())
        .from_env_lossy();
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
