mod completion;
mod http;
mod transfer;
mod types;

pub use completion::{
    CompletionTimings, CompletionTracker, DownloadState, PARTIAL_DOWNLOAD_SUFFIX,
    ScratchObservation, clear_scratch_dir, observe_scratch_dir, wait_for_download,
};
pub use http::{DOWNLOAD_CHUNK_SIZE, build_http_operator, split_download_url, stream_to_file};
pub use transfer::move_into_place;
pub use types::DownloadItem;
