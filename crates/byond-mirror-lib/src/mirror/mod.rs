mod orchestrator;
mod report;

pub use orchestrator::{MirrorOptions, run_mirror};
pub use report::{ChannelReport, MirrorReport};
