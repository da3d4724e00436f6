//! Browser-driven source for listings hidden behind JavaScript rendering or bot checks.
//!
//! Every listing and every download runs in its own Chromium session. Downloads land in a
//! scratch directory and are watched with [`wait_for_download`] before being moved into the
//! mirror.

use super::prompt::{ChallengePrompt, StdinPrompt};
use super::MirrorSource;
use crate::channel::Channel;
use crate::config::BrowserConfig;
use crate::download::{
    CompletionTimings, DownloadItem, DownloadState, clear_scratch_dir, move_into_place,
    wait_for_download,
};
use crate::error::MirrorError;
use crate::listing::{AcceptedSuffixes, select_build_files};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig as ChromeConfig, Page};
use futures::StreamExt;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

fn browser_error(err: impl std::fmt::Display) -> MirrorError {
    MirrorError::Browser {
        reason: err.to_string(),
    }
}

struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
}

impl BrowserSession {
    async fn launch(config: &BrowserConfig, download_dir: &Path) -> Result<Self, MirrorError> {
        tracing::debug!(headless = config.headless, "Launching browser");

        let mut builder = ChromeConfig::builder();
        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage");
        for arg in &config.args {
            builder = builder.arg(arg.as_str());
        }
        let chrome_config = builder.build().map_err(browser_error)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(browser_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let session = Self {
            browser,
            handler,
            user_agent: config.user_agent.clone(),
        };

        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().into_owned())
            .build()
            .map_err(browser_error);
        let routed = match behavior {
            Ok(params) => session
                .browser
                .execute(params)
                .await
                .map(|_| ())
                .map_err(browser_error),
            Err(err) => Err(err),
        };
        if let Err(err) = routed {
            session.close().await;
            return Err(err);
        }

        Ok(session)
    }

    async fn new_tab(&self) -> Result<Page, MirrorError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;
        if let Some(user_agent) = &self.user_agent {
            page.execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .map_err(browser_error)?;
        }
        Ok(page)
    }

    async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", err);
        }
        if let Err(err) = self.browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", err);
        }
        self.handler.abort();
    }
}

pub struct BrowserSource<P = StdinPrompt> {
    config: BrowserConfig,
    suffixes: AcceptedSuffixes,
    timings: CompletionTimings,
    scratch_dir: PathBuf,
    manual_pause: bool,
    prompt: P,
}

impl<P: ChallengePrompt> BrowserSource<P> {
    pub fn new(
        config: BrowserConfig,
        suffixes: AcceptedSuffixes,
        timings: CompletionTimings,
        scratch_dir: PathBuf,
        manual_pause: bool,
        prompt: P,
    ) -> Self {
        Self {
            config,
            suffixes,
            timings,
            scratch_dir,
            manual_pause,
            prompt,
        }
    }

    async fn pause_for_operator(&mut self, message: String) -> Result<(), MirrorError> {
        if self.manual_pause {
            self.prompt.wait_for_operator(&message).await?;
        }
        Ok(())
    }

    async fn read_listing(
        &mut self,
        session: &BrowserSession,
        channel: &Channel,
    ) -> Result<String, MirrorError> {
        let page = session.new_tab().await?;
        page.goto(channel.remote_base.as_str())
            .await
            .map_err(browser_error)?;

        self.pause_for_operator(format!(
            "Clear any challenge shown for the {} listing",
            channel.id
        ))
        .await?;

        page.content().await.map_err(browser_error)
    }

    async fn run_download(
        &mut self,
        session: &BrowserSession,
        item: &DownloadItem,
    ) -> Result<DownloadState, MirrorError> {
        if self.config.open_in_new_tab {
            // Keeps the listing page's cookies and referrer around for the file request.
            let listing = session.new_tab().await?;
            if let Err(err) = listing.goto(item.listing_url.as_str()).await {
                tracing::debug!(url = %item.listing_url, "Listing page did not load: {}", err);
            }
        }

        let page = session.new_tab().await?;
        // Navigating to a file is usually reported as aborted once Chromium turns it into a download.
        if let Err(err) = page.goto(item.url.as_str()).await {
            tracing::debug!(url = %item.url, "Navigation ended early: {}", err);
        }

        self.pause_for_operator(format!("Clear any challenge shown for {}", item.file_name))
            .await?;

        Ok(wait_for_download(&self.scratch_dir, &item.file_name, self.timings).await)
    }

    async fn discard_scratch(&self, item: &DownloadItem) {
        if let Err(err) = clear_scratch_dir(&self.scratch_dir, &item.file_name).await {
            tracing::warn!(dir = %self.scratch_dir.display(), "Failed to clean scratch directory: {}", err);
        }
    }
}

impl<P: ChallengePrompt> MirrorSource for BrowserSource<P> {
    async fn list_files(&mut self, channel: &Channel) -> Result<BTreeSet<String>, MirrorError> {
        let session = BrowserSession::launch(&self.config, &self.scratch_dir).await?;
        let result = self.read_listing(&session, channel).await;
        session.close().await;

        let html = result.map_err(|e| MirrorError::ListingFetch {
            channel: channel.id.clone(),
            url: channel.remote_base.to_string(),
            reason: e.to_string(),
        })?;
        select_build_files(&html, channel, &self.suffixes)
    }

    async fn fetch(&mut self, item: &DownloadItem) -> Result<(), MirrorError> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| MirrorError::DirectoryCreation {
                path: self.scratch_dir.clone(),
                reason: e.to_string(),
            })?;
        self.discard_scratch(item).await;

        let session = BrowserSession::launch(&self.config, &self.scratch_dir)
            .await
            .map_err(|e| item.download_error(e))?;
        let result = self.run_download(&session, item).await;
        session.close().await;

        let state = match result {
            Ok(state) => state,
            Err(err) => {
                self.discard_scratch(item).await;
                return Err(item.download_error(err));
            }
        };

        match state {
            DownloadState::Complete => {
                let scratch_file = self.scratch_dir.join(&item.file_name);
                let size = tokio::fs::metadata(&scratch_file).await.map(|m| m.len()).unwrap_or(0);
                if size == 0 {
                    self.discard_scratch(item).await;
                    return Err(item.download_error("Browser saved an empty file"));
                }
                if let Err(err) = move_into_place(&scratch_file, &item.output_path).await {
                    self.discard_scratch(item).await;
                    return Err(item.download_error(format!("Failed to move download: {}", err)));
                }
                Ok(())
            }
            DownloadState::TimedOut => {
                self.discard_scratch(item).await;
                Err(item.download_error(format!(
                    "Timed out after {:?} waiting for the download",
                    self.timings.completion_timeout
                )))
            }
            state => {
                self.discard_scratch(item).await;
                Err(item.download_error(format!("Download ended in state {:?}", state)))
            }
        }
    }
}
