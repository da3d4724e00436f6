//! Where build listings and files come from.
//!
//! The mirror pipeline only needs two capabilities from the remote side: list the build
//! files of a channel, and fetch one of them into a local path. [`MirrorSource`] is that
//! seam; the orchestrator is generic over it.

#[cfg(feature = "browser")]
mod browser;
mod http;
mod prompt;

#[cfg(feature = "browser")]
pub use browser::BrowserSource;
pub use http::HttpSource;
pub use prompt::{ChallengePrompt, LinePrompt, StdinPrompt};

use crate::channel::Channel;
use crate::download::DownloadItem;
use crate::error::MirrorError;
use std::collections::BTreeSet;

#[allow(async_fn_in_trait)]
pub trait MirrorSource {
    /// Build file names currently offered for `channel`.
    async fn list_files(&mut self, channel: &Channel) -> Result<BTreeSet<String>, MirrorError>;

    /// Fetches `item.url` into `item.output_path`. On error nothing is left at the output path.
    async fn fetch(&mut self, item: &DownloadItem) -> Result<(), MirrorError>;
}
