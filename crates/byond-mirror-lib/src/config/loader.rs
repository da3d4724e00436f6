use super::Config;
use crate::error::MirrorError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, MirrorError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    #[test]
    fn test_load_config_applies_defaults_to_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.toml");
        std::fs::write(
            &path,
            r#"
[output]
path = "/srv/byond"

[[channels]]
id = "514"
remote_base = "https://www.byond.com/download/build/514/"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();

        assert_eq!(config.output.path, std::path::PathBuf::from("/srv/byond"));
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].id, "514");
        assert_eq!(config.channels[0].local_dir, None);
        assert_eq!(config.download.backend, Backend::Http);
        assert_eq!(config.download.pause_between_downloads_ms, 1000);
        assert_eq!(config.listing.accepted_suffixes.len(), 3);
    }

    #[test]
    fn test_load_config_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.yaml");
        std::fs::write(&path, "download:\n  parallelism: 4\n").unwrap();

        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
