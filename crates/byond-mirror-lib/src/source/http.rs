use super::MirrorSource;
use crate::channel::Channel;
use crate::download::{DownloadItem, build_http_operator, split_download_url, stream_to_file};
use crate::error::MirrorError;
use crate::listing::{AcceptedSuffixes, select_build_files};
use opendal::Operator;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Reads listings with plain GET requests and streams files through OpenDAL.
pub struct HttpSource {
    client: reqwest::Client,
    suffixes: AcceptedSuffixes,
    // One operator per host so files from the same site reuse one HTTP client.
    operators: HashMap<String, Operator>,
}

impl HttpSource {
    pub fn new(suffixes: AcceptedSuffixes) -> Result<Self, MirrorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("byond-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            suffixes,
            operators: HashMap::new(),
        })
    }

    fn operator_for(&mut self, endpoint: String) -> Result<Operator, MirrorError> {
        let op = match self.operators.entry(endpoint) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let op = build_http_operator(entry.key())?;
                entry.insert(op)
            }
        };
        Ok(op.clone())
    }

    async fn fetch_listing_page(&self, channel: &Channel) -> Result<String, reqwest::Error> {
        self.client
            .get(channel.remote_base.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

impl MirrorSource for HttpSource {
    async fn list_files(&mut self, channel: &Channel) -> Result<BTreeSet<String>, MirrorError> {
        tracing::debug!(channel = %channel.id, url = %channel.remote_base, "Requesting build listing");

        let html = self
            .fetch_listing_page(channel)
            .await
            .map_err(|e| MirrorError::ListingFetch {
                channel: channel.id.clone(),
                url: channel.remote_base.to_string(),
                reason: e.to_string(),
            })?;

        select_build_files(&html, channel, &self.suffixes)
    }

    async fn fetch(&mut self, item: &DownloadItem) -> Result<(), MirrorError> {
        let (endpoint, rel_path) =
            split_download_url(&item.url).map_err(|e| item.download_error(format!("{:#}", e)))?;
        let op = self.operator_for(endpoint)?;

        let bytes = stream_to_file(&op, &rel_path, &item.output_path)
            .await
            .map_err(|e| item.download_error(format!("{:#}", e)))?;

        tracing::debug!(
            file = %item.file_name,
            output = %item.output_path.display(),
            bytes,
            "Stream finished"
        );
        Ok(())
    }
}
