mod anchors;
mod pattern;

pub use anchors::extract_anchor_names;
pub use pattern::{AcceptedSuffixes, BuildFilePattern};

use crate::channel::Channel;
use crate::error::MirrorError;
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// True when `name` can only ever resolve to an entry directly inside the channel directory.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Parses a rendered directory page and keeps the names that look like builds of `channel`.
pub fn select_build_files(
    html: &str,
    channel: &Channel,
    suffixes: &AcceptedSuffixes,
) -> Result<BTreeSet<String>, MirrorError> {
    let pattern = BuildFilePattern::for_channel(&channel.id, suffixes.clone())?;
    let names = extract_anchor_names(html)?;
    let total = names.len();

    let selected: BTreeSet<String> = names
        .into_iter()
        .filter(|name| pattern.matches(name))
        .filter(|name| {
            let plain = is_plain_file_name(name);
            if !plain {
                tracing::warn!(channel = %channel.id, "Ignoring listed name with a path: {}", name);
            }
            plain
        })
        .collect();

    tracing::debug!(
        channel = %channel.id,
        anchors = total,
        matching = selected.len(),
        "Parsed build listing"
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelDef, ListingConfig};
    use std::path::Path;

    const LISTING: &str = r#"<html><body>
        <h1>Index of /download/build/515</h1>
        <a href="../">Parent Directory</a>
        <a href="515.1630_byond.exe">515.1630_byond.exe</a>
        <a href="515.1630_byond.zip">515.1630_byond.zip</a>
        <a href="515.1630_byond_linux.zip">515.1630_byond_linux.zip</a>
        <a href="515.1630_byond.exe.sha256">515.1630_byond.exe.sha256</a>
        <a href="516.1650_byond.exe">516.1650_byond.exe</a>
        <a href="notes.txt">notes.txt</a>
    </body></html>"#;

    #[test]
    fn test_select_build_files_keeps_channel_builds_only() {
        let channel = Channel::from_def(&ChannelDef::byond("515"), Path::new("public")).unwrap();
        let suffixes = AcceptedSuffixes::from(&ListingConfig::default());

        let selected = select_build_files(LISTING, &channel, &suffixes).unwrap();

        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec![
                "515.1630_byond.exe".to_string(),
                "515.1630_byond.zip".to_string(),
                "515.1630_byond_linux.zip".to_string(),
            ]
        );
    }

    #[test]
    fn test_select_build_files_without_matching_anchors_is_empty() {
        let channel = Channel::from_def(&ChannelDef::byond("516"), Path::new("public")).unwrap();
        let suffixes = AcceptedSuffixes::from(&ListingConfig::default());

        let selected = select_build_files(
            "<html><body><p>Checking your browser...</p></body></html>",
            &channel,
            &suffixes,
        )
        .unwrap();

        assert!(selected.is_empty());
    }

    #[test]
    fn test_select_build_files_drops_names_that_escape_the_channel_dir() {
        let channel = Channel::from_def(&ChannelDef::byond("515"), Path::new("public")).unwrap();
        let suffixes = AcceptedSuffixes::from(&ListingConfig::default());
        let html = r#"<html><body>
            <a href="a">../../../tmp/515.1_byond.exe</a>
            <a href="b">/tmp/515.2_byond.exe</a>
            <a href="c">sub\515.3_byond.exe</a>
            <a href="d">515.4_byond.exe</a>
        </body></html>"#;

        let selected = select_build_files(html, &channel, &suffixes).unwrap();

        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec!["515.4_byond.exe".to_string()]
        );
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("515.1630_byond.exe"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("a/515.1_byond.exe"));
        assert!(!is_plain_file_name("a\\515.1_byond.exe"));
    }
}
