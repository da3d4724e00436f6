mod args;
mod mirror;
mod params;
mod resolved_command;

pub use args::{Args, Command, init_tracing, parse_args};
pub use mirror::run_mirror_command;
pub use params::MirrorParams;
pub use resolved_command::resolve_command;
