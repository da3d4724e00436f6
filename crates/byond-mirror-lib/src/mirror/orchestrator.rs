use super::report::{ChannelReport, MirrorReport};
use crate::channel::Channel;
use crate::download::DownloadItem;
use crate::error::MirrorError;
use crate::inventory::{pending_files, scan_local_inventory};
use crate::listing::AcceptedSuffixes;
use crate::output::generate_channel_index;
use crate::source::MirrorSource;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct MirrorOptions {
    pub suffixes: AcceptedSuffixes,
    /// Sleep after every download attempt to bound the request rate
    pub pause_between_downloads: Duration,
}

/// Mirrors every channel in order, one file at a time.
///
/// Listing and download failures are logged and skipped; a later run retries whatever is
/// still missing. Only filesystem errors on the mirror tree itself abort the run.
pub async fn run_mirror<S: MirrorSource>(
    channels: &[Channel],
    options: &MirrorOptions,
    source: &mut S,
) -> Result<MirrorReport, MirrorError> {
    let mut report = MirrorReport::default();
    for channel in channels {
        report
            .channels
            .push(mirror_channel(channel, options, source).await?);
    }
    Ok(report)
}

async fn mirror_channel<S: MirrorSource>(
    channel: &Channel,
    options: &MirrorOptions,
    source: &mut S,
) -> Result<ChannelReport, MirrorError> {
    let local = scan_local_inventory(&channel.local_dir)?;
    tracing::info!(
        channel = %channel.id,
        "Found {} existing files in {}",
        local.len(),
        channel.local_dir.display()
    );

    let remote = list_remote_files(source, channel).await;
    tracing::info!(
        channel = %channel.id,
        "Found {} builds available",
        remote.len()
    );

    for file_name in remote.intersection(&local) {
        tracing::info!(channel = %channel.id, "File {} already exists, skipping", file_name);
    }

    let pending = pending_files(&remote, &local);
    let mut downloaded = Vec::new();
    let mut failed = Vec::new();
    for file_name in pending {
        if download_file(source, channel, &file_name).await {
            downloaded.push(file_name);
        } else {
            failed.push(file_name);
        }

        if !options.pause_between_downloads.is_zero() {
            tokio::time::sleep(options.pause_between_downloads).await;
        }
    }

    let index_path = generate_channel_index(channel, &options.suffixes)?;

    Ok(ChannelReport {
        channel_id: channel.id.clone(),
        existing: local.len(),
        remote: remote.len(),
        downloaded,
        failed,
        index_path,
    })
}

async fn list_remote_files<S: MirrorSource>(source: &mut S, channel: &Channel) -> BTreeSet<String> {
    match source.list_files(channel).await {
        Ok(files) => files,
        Err(err) => {
            tracing::error!(
                channel = %channel.id,
                "Error fetching build list for channel {}: {}",
                channel.id,
                err
            );
            BTreeSet::new()
        }
    }
}

async fn download_file<S: MirrorSource>(source: &mut S, channel: &Channel, file_name: &str) -> bool {
    let item = match DownloadItem::for_channel(channel, file_name) {
        Ok(item) => item,
        Err(err) => {
            tracing::error!(channel = %channel.id, "Failed to download {}: {}", file_name, err);
            return false;
        }
    };

    tracing::info!(
        channel = %channel.id,
        url = %item.url,
        output = %item.output_path.display(),
        "Downloading"
    );

    if let Err(err) = source.fetch(&item).await {
        tracing::error!(channel = %channel.id, "Failed to download {}: {}", file_name, err);
        return false;
    }

    match std::fs::metadata(&item.output_path) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => {
            tracing::info!(
                channel = %channel.id,
                bytes = metadata.len(),
                "Successfully downloaded {}",
                file_name
            );
            true
        }
        Ok(metadata) => {
            if metadata.is_file() {
                discard_empty_download(&item);
            }
            tracing::error!(
                channel = %channel.id,
                output = %item.output_path.display(),
                "Failed to download {}: file empty after fetch",
                file_name
            );
            false
        }
        Err(_) => {
            tracing::error!(
                channel = %channel.id,
                output = %item.output_path.display(),
                "Failed to download {}: file missing after fetch",
                file_name
            );
            false
        }
    }
}

/// An empty file at the target would be mistaken for a finished download on the next run.
fn discard_empty_download(item: &DownloadItem) {
    if let Err(err) = std::fs::remove_file(&item.output_path) {
        tracing::warn!(
            channel = %item.channel_id,
            output = %item.output_path.display(),
            "Failed to remove empty download: {}",
            err
        );
    }
}
