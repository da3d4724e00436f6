use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use byond_mirror_lib::channel::Channel;
use byond_mirror_lib::config::{ChannelDef, Config, DownloadConfig, OutputConfig};
use byond_mirror_lib::download::DownloadItem;
use byond_mirror_lib::error::MirrorError;
use byond_mirror_lib::listing::AcceptedSuffixes;
use byond_mirror_lib::mirror::MirrorOptions;
use byond_mirror_lib::source::MirrorSource;
use eyre::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use url::Url;

pub fn create_test_config(output_root: &Path, site: &Url) -> Config {
    let channel = |id: &str| ChannelDef {
        id: id.to_string(),
        remote_base: format!("{}download/build/{}/", site, id),
        local_dir: None,
    };
    Config {
        output: OutputConfig {
            path: output_root.to_path_buf(),
        },
        channels: vec![channel("515"), channel("516")],
        download: DownloadConfig {
            pause_between_downloads_ms: 0,
            ..DownloadConfig::default()
        },
        ..Config::default()
    }
}

pub fn setup_test_environment(site: &Url) -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;

    let config = create_test_config(&temp_dir.path().join("public"), site);
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    Ok(temp_dir)
}

pub fn test_channels(output_root: &Path, site: &Url) -> Vec<Channel> {
    create_test_config(output_root, site)
        .channels
        .iter()
        .map(|def| Channel::from_def(def, output_root).expect("valid test channel"))
        .collect()
}

pub fn test_options() -> MirrorOptions {
    MirrorOptions {
        suffixes: AcceptedSuffixes::from(&Config::default().listing),
        pause_between_downloads: Duration::ZERO,
    }
}

pub fn file_names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// In-memory stand-in for the remote site.
#[derive(Default)]
pub struct FakeSource {
    listings: HashMap<String, std::result::Result<Vec<String>, String>>,
    contents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    pub listed: Vec<String>,
    pub fetched: Vec<String>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build(mut self, channel_id: &str, file_name: &str, content: &[u8]) -> Self {
        self.listings
            .entry(channel_id.to_string())
            .or_insert_with(|| Ok(Vec::new()))
            .as_mut()
            .expect("listing was marked as failing")
            .push(file_name.to_string());
        self.contents.insert(file_name.to_string(), content.to_vec());
        self
    }

    pub fn with_failing_build(mut self, channel_id: &str, file_name: &str) -> Self {
        self = self.with_build(channel_id, file_name, b"never delivered");
        self.failing.insert(file_name.to_string());
        self
    }

    pub fn with_listing_error(mut self, channel_id: &str, reason: &str) -> Self {
        self.listings
            .insert(channel_id.to_string(), Err(reason.to_string()));
        self
    }
}

impl MirrorSource for FakeSource {
    async fn list_files(
        &mut self,
        channel: &Channel,
    ) -> std::result::Result<BTreeSet<String>, MirrorError> {
        self.listed.push(channel.id.clone());
        match self.listings.get(&channel.id) {
            Some(Ok(names)) => Ok(names.iter().cloned().collect()),
            Some(Err(reason)) => Err(MirrorError::ListingFetch {
                channel: channel.id.clone(),
                url: channel.remote_base.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(BTreeSet::new()),
        }
    }

    async fn fetch(&mut self, item: &DownloadItem) -> std::result::Result<(), MirrorError> {
        self.fetched.push(item.file_name.clone());
        if self.failing.contains(&item.file_name) {
            return Err(item.download_error("connection reset by peer"));
        }
        if item.output_path.exists() {
            return Err(item.download_error("target already exists"));
        }
        let content = self
            .contents
            .get(&item.file_name)
            .ok_or_else(|| item.download_error("404 Not Found"))?;
        std::fs::write(&item.output_path, content)?;
        Ok(())
    }
}

/// Builds served by [`start_fake_site`], keyed by channel then file name.
#[derive(Default)]
pub struct FakeSite {
    pub builds: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    /// Files that are listed but answer with a server error
    pub broken: HashSet<String>,
    /// Channels whose listing page answers with a server error
    pub broken_listings: HashSet<String>,
    pub requests: Mutex<HashMap<String, usize>>,
}

impl FakeSite {
    pub fn with_build(mut self, channel_id: &str, file_name: &str, content: &[u8]) -> Self {
        self.builds
            .entry(channel_id.to_string())
            .or_default()
            .insert(file_name.to_string(), content.to_vec());
        self
    }

    pub fn with_broken_build(mut self, channel_id: &str, file_name: &str) -> Self {
        self = self.with_build(channel_id, file_name, b"");
        self.broken.insert(file_name.to_string());
        self
    }

    pub fn with_broken_listing(mut self, channel_id: &str) -> Self {
        self.broken_listings.insert(channel_id.to_string());
        self
    }

    pub fn request_count(&self, file_name: &str) -> usize {
        self.requests
            .lock()
            .expect("request log poisoned")
            .get(file_name)
            .copied()
            .unwrap_or(0)
    }

    fn listing_page(&self, channel_id: &str) -> String {
        let mut html = format!(
            "<html><head><title>Index of /download/build/{0}</title></head><body>\n<h1>Index of /download/build/{0}</h1>\n<a href=\"../\">Parent Directory</a><br>\n",
            channel_id
        );
        if let Some(files) = self.builds.get(channel_id) {
            for name in files.keys() {
                html.push_str(&format!("<a href=\"{0}\">{0}</a><br>\n", name));
            }
        }
        html.push_str("<a href=\"/download/changelog.html\">Release notes</a>\n</body></html>\n");
        html
    }
}

async fn serve_listing(
    State(site): State<Arc<FakeSite>>,
    UrlPath(channel_id): UrlPath<String>,
) -> Response {
    if site.broken_listings.contains(&channel_id) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Html(site.listing_page(&channel_id)).into_response()
}

async fn serve_build(
    State(site): State<Arc<FakeSite>>,
    UrlPath((channel_id, file_name)): UrlPath<(String, String)>,
) -> Response {
    *site
        .requests
        .lock()
        .expect("request log poisoned")
        .entry(file_name.clone())
        .or_default() += 1;

    if site.broken.contains(&file_name) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match site
        .builds
        .get(&channel_id)
        .and_then(|files| files.get(&file_name))
    {
        Some(content) => (StatusCode::OK, content.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves `site` on an ephemeral local port, laid out like the BYOND download area.
pub async fn start_fake_site(site: Arc<FakeSite>) -> (Url, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/download/build/{channel}/", get(serve_listing))
        .route("/download/build/{channel}/{file}", get(serve_build))
        .with_state(site);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake site");
    let addr: SocketAddr = listener.local_addr().expect("Fake site has no address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake site crashed");
    });
    let url = Url::parse(&format!("http://{}/", addr)).expect("Invalid fake site URL");
    (url, handle)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("byond_mirror_lib=debug,byond_mirror_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
