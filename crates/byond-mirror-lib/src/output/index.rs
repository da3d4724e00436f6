use crate::channel::Channel;
use crate::error::MirrorError;
use crate::listing::AcceptedSuffixes;
use itertools::Itertools;
use std::fmt::Write;
use std::path::PathBuf;

pub const INDEX_FILE_NAME: &str = "index.html";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the listing page for one channel. `file_names` are emitted in the given order.
pub fn render_channel_index<S: AsRef<str>>(channel_id: &str, file_names: &[S]) -> String {
    let title = format!("BYOND {} builds", escape_html(channel_id));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", title);
    html.push_str("<p><a href=\"../\">Back to all versions</a></p>\n<ul>\n");
    for name in file_names {
        let name = name.as_ref();
        let href = escape_html(&urlencoding::encode(name));
        let _ = writeln!(html, "<li><a href=\"{}\">{}</a></li>", href, escape_html(name));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

/// Rewrites `index.html` in the channel directory from the files currently held there.
pub fn generate_channel_index(
    channel: &Channel,
    suffixes: &AcceptedSuffixes,
) -> Result<PathBuf, MirrorError> {
    let dir = &channel.local_dir;
    let read_error = |e: std::io::Error| MirrorError::DirectoryRead {
        path: dir.clone(),
        reason: e.to_string(),
    };

    let mut file_names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if !entry.file_type().map_err(read_error)?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if suffixes.matches(&name) {
            file_names.push(name);
        }
    }
    let file_names = file_names.into_iter().sorted().collect::<Vec<_>>();

    let index_path = dir.join(INDEX_FILE_NAME);
    std::fs::write(&index_path, render_channel_index(&channel.id, &file_names)).map_err(|e| {
        MirrorError::IndexWrite {
            path: index_path.clone(),
            reason: e.to_string(),
        }
    })?;

    tracing::info!(
        channel = %channel.id,
        files = file_names.len(),
        path = %index_path.display(),
        "Index generated"
    );
    Ok(index_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelDef, ListingConfig};

    fn channel_in(root: &std::path::Path, id: &str) -> Channel {
        let channel = Channel::from_def(&ChannelDef::byond(id), root).unwrap();
        std::fs::create_dir_all(&channel.local_dir).unwrap();
        channel
    }

    fn suffixes() -> AcceptedSuffixes {
        AcceptedSuffixes::from(&ListingConfig::default())
    }

    #[test]
    fn test_index_lists_matching_files_sorted() {
        let root = tempfile::tempdir().unwrap();
        let channel = channel_in(root.path(), "515");
        for name in ["515.1235_byond.zip", "515.1234_byond.exe", "notes.txt"] {
            std::fs::write(channel.local_dir.join(name), b"x").unwrap();
        }

        let path = generate_channel_index(&channel, &suffixes()).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();

        let entries: Vec<&str> = html.lines().filter(|l| l.starts_with("<li>")).collect();
        assert_eq!(
            entries,
            vec![
                "<li><a href=\"515.1234_byond.exe\">515.1234_byond.exe</a></li>",
                "<li><a href=\"515.1235_byond.zip\">515.1235_byond.zip</a></li>",
            ]
        );
        assert!(html.contains("<a href=\"../\">"));
        assert!(!html.contains("notes.txt"));
        assert!(!html.contains("index.html\">"));
    }

    #[test]
    fn test_index_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let channel = channel_in(root.path(), "516");
        std::fs::write(channel.local_dir.join("516.1650_byond.exe"), b"x").unwrap();

        let first = std::fs::read(generate_channel_index(&channel, &suffixes()).unwrap()).unwrap();
        let second = std::fs::read(generate_channel_index(&channel, &suffixes()).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_index_skips_directories() {
        let root = tempfile::tempdir().unwrap();
        let channel = channel_in(root.path(), "515");
        std::fs::create_dir(channel.local_dir.join("archive.zip")).unwrap();

        let html =
            std::fs::read_to_string(generate_channel_index(&channel, &suffixes()).unwrap()).unwrap();

        assert!(!html.contains("archive.zip"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render_channel_index("515", &["a&b<c>.exe"]);

        assert!(html.contains("<li><a href=\"a%26b%3Cc%3E.exe\">a&amp;b&lt;c&gt;.exe</a></li>"));
    }

    #[test]
    fn test_render_percent_encodes_links() {
        let html = render_channel_index("515", &["515.1 beta#2?.exe", "515.1630_byond.exe"]);

        assert!(html.contains("<li><a href=\"515.1%20beta%232%3F.exe\">515.1 beta#2?.exe</a></li>"));
        assert!(html.contains("<li><a href=\"515.1630_byond.exe\">515.1630_byond.exe</a></li>"));
    }

    #[test]
    fn test_render_empty_listing() {
        let html = render_channel_index::<&str>("516", &[]);

        assert!(html.contains("<title>BYOND 516 builds</title>"));
        assert!(html.contains("<ul>\n</ul>"));
    }
}
