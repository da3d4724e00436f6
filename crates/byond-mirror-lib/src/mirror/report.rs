use std::path::PathBuf;

/// Outcome of mirroring one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel_id: String,
    /// Entries present locally before any download
    pub existing: usize,
    /// Matching build files seen on the remote listing
    pub remote: usize,
    pub downloaded: Vec<String>,
    pub failed: Vec<String>,
    pub index_path: PathBuf,
}

impl ChannelReport {
    pub fn pending(&self) -> usize {
        self.downloaded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub channels: Vec<ChannelReport>,
}

impl MirrorReport {
    pub fn downloaded_count(&self) -> usize {
        self.channels.iter().map(|c| c.downloaded.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.channels.iter().map(|c| c.failed.len()).sum()
    }

    pub fn channel(&self, channel_id: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }
}
