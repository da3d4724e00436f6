pub mod channel;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod inventory;
pub mod listing;
pub mod mirror;
pub mod output;
pub mod source;

pub use channel::Channel;
pub use config::Config;
pub use error::MirrorError;
