use crate::config::Backend;
use crate::error::MirrorError;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Default)]
pub struct Command {
    pub config_path: Option<String>,
    pub output_dir: Option<String>,
    pub backend: Option<Backend>,
    pub manual_pause: bool,
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "byond-mirror",
    version,
    about = "Download new BYOND build installers and publish them as a static file listing"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count
    )]
    verbose: u8,

    #[arg(
        short = 'm',
        long = "manual-pause",
        help = "Wait for Enter after each page load so a CAPTCHA can be solved by hand (implies --backend browser)"
    )]
    manual_pause: bool,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Optional config file; built-in defaults are used without one"
    )]
    config: Option<String>,

    #[arg(
        long = "backend",
        value_name = "BACKEND",
        value_enum,
        help = "Overrides how listings and files are retrieved"
    )]
    backend: Option<Backend>,

    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "Overrides the mirror root directory"
    )]
    output_dir: Option<String>,

    #[arg(
        long = "log-file",
        value_name = "FILE",
        help = "Log file, appended to on every run",
        default_value = "byond-mirror.log"
    )]
    log_file: PathBuf,
}

pub fn parse_args() -> Result<Args, MirrorError> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    init_tracing(log_level, &cli.log_file)?;

    let command = Command {
        config_path: cli.config,
        output_dir: cli.output_dir,
        backend: cli.backend,
        manual_pause: cli.manual_pause,
    };

    Ok(Args { command, log_level })
}

/// Logs to stdout and, without ANSI colours, to `log_file`.
pub fn init_tracing(log_level: Level, log_file: &Path) -> Result<(), MirrorError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| MirrorError::LogFile {
            path: log_file.to_path_buf(),
            reason: e.to_string(),
        })?;

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy()
        .add_directive(
            "html5ever=warn"
                .parse()
                .map_err(|e| eyre::eyre!("Invalid log directive: {}", e))?,
        );

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install log subscriber: {}", e))?;

    Ok(())
}
