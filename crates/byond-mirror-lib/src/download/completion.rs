//! Completion detection for downloads handed off to a browser.
//!
//! The browser writes into a scratch directory; while a transfer is running Chromium keeps a
//! `*.crdownload` marker next to the final file. The scratch directory is observed at fixed
//! intervals and each observation drives [`CompletionTracker`] until it reaches a terminal
//! [`DownloadState`].

use crate::config::DownloadConfig;
use std::path::Path;
use std::time::{Duration, Instant};

pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".crdownload";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadState {
    NotStarted,
    InProgress,
    Complete,
    TimedOut,
    Failed,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::TimedOut | Self::Failed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionTimings {
    /// How long to wait for the transfer to show up at all
    pub start_timeout: Duration,
    /// Overall deadline, measured from the start of the wait
    pub completion_timeout: Duration,
    pub start_poll_interval: Duration,
    pub completion_poll_interval: Duration,
}

impl Default for CompletionTimings {
    fn default() -> Self {
        Self::from(&DownloadConfig::default())
    }
}

impl From<&DownloadConfig> for CompletionTimings {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            start_timeout: Duration::from_secs(config.start_timeout_secs),
            completion_timeout: Duration::from_secs(config.completion_timeout_secs),
            start_poll_interval: Duration::from_millis(config.start_poll_interval_ms),
            completion_poll_interval: Duration::from_millis(config.completion_poll_interval_ms),
        }
    }
}

/// What a single look at the scratch directory found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchObservation {
    pub target_present: bool,
    pub partial_present: bool,
}

#[derive(Debug)]
pub struct CompletionTracker {
    state: DownloadState,
    timings: CompletionTimings,
}

impl CompletionTracker {
    pub fn new(timings: CompletionTimings) -> Self {
        Self {
            state: DownloadState::NotStarted,
            timings,
        }
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    pub fn poll_interval(&self) -> Duration {
        match self.state {
            DownloadState::NotStarted => self.timings.start_poll_interval,
            _ => self.timings.completion_poll_interval,
        }
    }

    /// Feeds one observation taken `elapsed` after the wait began.
    pub fn advance(&mut self, observation: ScratchObservation, elapsed: Duration) -> DownloadState {
        let ScratchObservation {
            target_present,
            partial_present,
        } = observation;

        self.state = match self.state {
            DownloadState::NotStarted if partial_present => {
                if elapsed >= self.timings.completion_timeout {
                    DownloadState::TimedOut
                } else {
                    DownloadState::InProgress
                }
            }
            DownloadState::NotStarted if target_present => DownloadState::Complete,
            DownloadState::NotStarted if elapsed >= self.timings.start_timeout => {
                DownloadState::TimedOut
            }
            DownloadState::InProgress if !partial_present => {
                if target_present {
                    DownloadState::Complete
                } else {
                    DownloadState::Failed
                }
            }
            DownloadState::InProgress if elapsed >= self.timings.completion_timeout => {
                DownloadState::TimedOut
            }
            state => state,
        };
        self.state
    }

    /// Marks the download failed, e.g. when the scratch directory can no longer be read.
    pub fn fail(&mut self) -> DownloadState {
        if !self.state.is_terminal() {
            self.state = DownloadState::Failed;
        }
        self.state
    }
}

pub fn observe_scratch_dir(dir: &Path, file_name: &str) -> std::io::Result<ScratchObservation> {
    let mut observation = ScratchObservation::default();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(PARTIAL_DOWNLOAD_SUFFIX) {
            observation.partial_present = true;
        } else if name == file_name && entry.file_type()?.is_file() {
            observation.target_present = true;
        }
    }
    Ok(observation)
}

/// Removes what an earlier attempt at `file_name` may have left in the scratch directory.
pub async fn clear_scratch_dir(dir: &Path, file_name: &str) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == file_name || name.ends_with(PARTIAL_DOWNLOAD_SUFFIX) {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// Polls `dir` until `file_name` has fully arrived or the download is given up on.
pub async fn wait_for_download(
    dir: &Path,
    file_name: &str,
    timings: CompletionTimings,
) -> DownloadState {
    let mut tracker = CompletionTracker::new(timings);
    let started = Instant::now();

    loop {
        let state = match observe_scratch_dir(dir, file_name) {
            Ok(observation) => {
                let previous = tracker.state();
                let state = tracker.advance(observation, started.elapsed());
                if state != previous {
                    tracing::debug!(file = file_name, from = ?previous, to = ?state, "Download state changed");
                }
                state
            }
            Err(err) => {
                tracing::warn!(dir = %dir.display(), "Failed to observe scratch directory: {}", err);
                tracker.fail()
            }
        };

        if state.is_terminal() {
            return state;
        }
        tokio::time::sleep(tracker.poll_interval()).await;
    }
}
