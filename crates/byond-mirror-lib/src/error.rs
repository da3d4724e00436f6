use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {details}")]
    ConfigValidation { details: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Directory creation failed at {path}: {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("Failed to read directory {path}: {reason}")]
    DirectoryRead { path: PathBuf, reason: String },

    #[error("Failed to write index {path}: {reason}")]
    IndexWrite { path: PathBuf, reason: String },

    #[error("Failed to fetch build listing for channel {channel} from {url}: {reason}")]
    ListingFetch {
        channel: String,
        url: String,
        reason: String,
    },

    #[error("Failed to download {file} from {url}: {reason}")]
    FileDownload {
        file: String,
        url: String,
        reason: String,
    },

    #[error("Browser session error: {reason}")]
    Browser { reason: String },

    #[error("Failed to open log file {path}: {reason}")]
    LogFile { path: PathBuf, reason: String },

    #[error("Invalid file name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
