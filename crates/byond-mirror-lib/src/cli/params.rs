use crate::channel::Channel;
use crate::config::Config;
use crate::mirror::MirrorOptions;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MirrorParams {
    pub config: Config,
    pub channels: Vec<Channel>,
    pub options: MirrorOptions,
    pub scratch_dir: PathBuf,
}
