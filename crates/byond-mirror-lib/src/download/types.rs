use crate::channel::Channel;
use crate::error::MirrorError;
use std::path::PathBuf;
use url::Url;

#[derive(Clone, Debug)]
pub struct DownloadItem {
    pub channel_id: String,
    pub file_name: String,
    pub url: Url,
    /// Directory page the file was listed on
    pub listing_url: Url,
    pub output_path: PathBuf,
}

impl DownloadItem {
    pub fn for_channel(channel: &Channel, file_name: &str) -> Result<Self, MirrorError> {
        Ok(Self {
            channel_id: channel.id.clone(),
            file_name: file_name.to_string(),
            url: channel.file_url(file_name)?,
            listing_url: channel.remote_base.clone(),
            output_path: channel.local_path(file_name),
        })
    }

    pub fn download_error(&self, reason: impl ToString) -> MirrorError {
        MirrorError::FileDownload {
            file: self.file_name.clone(),
            url: self.url.to_string(),
            reason: reason.to_string(),
        }
    }
}
