use crate::channel::Channel;
use crate::cli::args::Command;
use crate::cli::params::MirrorParams;
use crate::config::{Backend, Config, load_config};
use crate::error::MirrorError;
use crate::listing::AcceptedSuffixes;
use crate::mirror::MirrorOptions;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SCRATCH_DIR_NAME: &str = ".incoming";

pub fn resolve_command(command: Command) -> Result<MirrorParams, MirrorError> {
    let Command {
        config_path,
        output_dir,
        backend,
        manual_pause,
    } = command;

    let mut config = match config_path {
        Some(config_path) => {
            tracing::info!("Loading configuration from {}", config_path);
            load_config(&config_path)?
        }
        None => Config::default(),
    };

    if let Some(output_dir) = output_dir {
        config.output.path = PathBuf::from(output_dir);
    }

    let manual_pause = manual_pause || config.download.manual_pause;
    let backend = match backend {
        Some(Backend::Http) if manual_pause => {
            return Err(MirrorError::CliArgumentValidation {
                details: "--manual-pause needs the browser back-end; drop --backend http."
                    .to_string(),
            });
        }
        Some(backend) => backend,
        None if manual_pause => Backend::Browser,
        None => config.download.backend,
    };

    if backend == Backend::Browser && !cfg!(feature = "browser") {
        return Err(MirrorError::CliArgumentValidation {
            details: "The browser back-end is not available in this build. Rebuild with --features browser.".to_string(),
        });
    }

    config.download.backend = backend;
    config.download.manual_pause = manual_pause;
    if manual_pause && config.browser.headless {
        tracing::info!("Manual pause enabled, showing the browser window");
        config.browser.headless = false;
    }

    validate_config(&config)?;

    let channels = config
        .channels
        .iter()
        .map(|def| Channel::from_def(def, &config.output.path))
        .collect::<Result<Vec<_>, _>>()?;

    let options = MirrorOptions {
        suffixes: AcceptedSuffixes::from(&config.listing),
        pause_between_downloads: Duration::from_millis(config.download.pause_between_downloads_ms),
    };

    let scratch_dir = config
        .download
        .scratch_dir
        .clone()
        .unwrap_or_else(|| config.output.path.join(DEFAULT_SCRATCH_DIR_NAME));

    Ok(MirrorParams {
        config,
        channels,
        options,
        scratch_dir,
    })
}

fn validate_config(config: &Config) -> Result<(), MirrorError> {
    if config.channels.is_empty() {
        return Err(MirrorError::ConfigValidation {
            details: "No channels defined in config".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for channel in &config.channels {
        if !seen.insert(channel.id.trim()) {
            return Err(MirrorError::ConfigValidation {
                details: format!("Channel {} is defined more than once", channel.id),
            });
        }
    }

    if config.listing.accepted_suffixes.is_empty()
        || config.listing.accepted_suffixes.iter().any(|s| s.is_empty())
    {
        return Err(MirrorError::ConfigValidation {
            details: "listing.accepted_suffixes must list at least one non-empty suffix".to_string(),
        });
    }

    let download = &config.download;
    for (name, value) in [
        ("download.start_timeout_secs", download.start_timeout_secs),
        ("download.completion_timeout_secs", download.completion_timeout_secs),
        ("download.start_poll_interval_ms", download.start_poll_interval_ms),
        ("download.completion_poll_interval_ms", download.completion_poll_interval_ms),
    ] {
        if value == 0 {
            return Err(MirrorError::ConfigValidation {
                details: format!("{name} must be greater than 0."),
            });
        }
    }

    Ok(())
}
