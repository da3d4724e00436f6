use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REMOTE_ROOT: &str = "https://www.byond.com/download/build/";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChannelDef {
    pub id: String,
    pub remote_base: String,
    /// Defaults to `<output.path>/<id>`
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
}

impl ChannelDef {
    pub fn byond(id: &str) -> Self {
        Self {
            id: id.to_string(),
            remote_base: format!("{DEFAULT_REMOTE_ROOT}{id}/"),
            local_dir: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Plain HTTP requests, listing parsed from the raw HTML.
    #[default]
    Http,
    /// Headless Chromium session, listing read from the rendered page.
    Browser,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelDef>,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            channels: default_channels(),
            listing: ListingConfig::default(),
            download: DownloadConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

fn default_channels() -> Vec<ChannelDef> {
    vec![ChannelDef::byond("515"), ChannelDef::byond("516")]
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("public"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListingConfig {
    pub accepted_suffixes: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            accepted_suffixes: vec![".exe".into(), ".zip".into(), "_linux.zip".into()],
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DownloadConfig {
    pub backend: Backend,
    pub manual_pause: bool,
    pub pause_between_downloads_ms: u64,
    pub start_timeout_secs: u64,
    pub completion_timeout_secs: u64,
    pub start_poll_interval_ms: u64,
    pub completion_poll_interval_ms: u64,
    /// Where the browser drops downloads before they are moved into the mirror.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            manual_pause: false,
            pause_between_downloads_ms: 1000,
            start_timeout_secs: 30,
            completion_timeout_secs: 120,
            start_poll_interval_ms: 100,
            completion_poll_interval_ms: 200,
            scratch_dir: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub open_in_new_tab: bool,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            open_in_new_tab: true,
            user_agent: None,
            args: Vec::new(),
        }
    }
}
