mod loader;
mod model;

pub use loader::load_config;
pub use model::{
    Backend, BrowserConfig, ChannelDef, Config, DownloadConfig, ListingConfig, OutputConfig,
};
