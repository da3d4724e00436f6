use crate::config::ChannelDef;
use crate::error::MirrorError;
use std::path::{Path, PathBuf};
use url::Url;

/// A tracked build line: where its listing lives and where its files are mirrored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub remote_base: Url,
    pub local_dir: PathBuf,
}

impl Channel {
    pub fn from_def(def: &ChannelDef, output_root: &Path) -> Result<Self, MirrorError> {
        let id = def.id.trim();
        if id.is_empty() {
            return Err(MirrorError::ConfigValidation {
                details: "Channel id must not be empty".to_string(),
            });
        }

        // Url::join replaces the last segment unless the base ends with a slash.
        let base = if def.remote_base.ends_with('/') {
            def.remote_base.clone()
        } else {
            format!("{}/", def.remote_base)
        };
        let remote_base = Url::parse(&base).map_err(|e| MirrorError::InvalidUrl {
            url: def.remote_base.clone(),
            reason: e.to_string(),
        })?;

        let local_dir = def
            .local_dir
            .clone()
            .unwrap_or_else(|| output_root.join(id));

        Ok(Self {
            id: id.to_string(),
            remote_base,
            local_dir,
        })
    }

    pub fn file_url(&self, file_name: &str) -> Result<Url, MirrorError> {
        self.remote_base
            .join(file_name)
            .map_err(|e| MirrorError::InvalidUrl {
                url: format!("{}{}", self.remote_base, file_name),
                reason: e.to_string(),
            })
    }

    pub fn local_path(&self, file_name: &str) -> PathBuf {
        self.local_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_def_defaults_local_dir_under_output_root() {
        let channel = Channel::from_def(&ChannelDef::byond("515"), Path::new("public")).unwrap();

        assert_eq!(channel.id, "515");
        assert_eq!(channel.local_dir, PathBuf::from("public/515"));
        assert_eq!(
            channel.remote_base.as_str(),
            "https://www.byond.com/download/build/515/"
        );
    }

    #[test]
    fn test_from_def_appends_missing_trailing_slash() {
        let def = ChannelDef {
            id: "516".to_string(),
            remote_base: "http://localhost:8080/build/516".to_string(),
            local_dir: Some(PathBuf::from("/mirror/beta")),
        };
        let channel = Channel::from_def(&def, Path::new("public")).unwrap();

        assert_eq!(channel.local_dir, PathBuf::from("/mirror/beta"));
        assert_eq!(
            channel.file_url("516.1661_byond.exe").unwrap().as_str(),
            "http://localhost:8080/build/516/516.1661_byond.exe"
        );
    }

    #[test]
    fn test_from_def_rejects_invalid_url() {
        let def = ChannelDef {
            id: "515".to_string(),
            remote_base: "not a url".to_string(),
            local_dir: None,
        };

        assert!(matches!(
            Channel::from_def(&def, Path::new("public")),
            Err(MirrorError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_from_def_rejects_empty_id() {
        let def = ChannelDef {
            id: "  ".to_string(),
            remote_base: "https://example.com/".to_string(),
            local_dir: None,
        };

        assert!(matches!(
            Channel::from_def(&def, Path::new("public")),
            Err(MirrorError::ConfigValidation { .. })
        ));
    }
}
