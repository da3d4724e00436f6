mod index;

pub use index::{INDEX_FILE_NAME, generate_channel_index, render_channel_index};
