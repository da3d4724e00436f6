use crate::config::ListingConfig;
use crate::error::MirrorError;
use regex::Regex;

/// File name endings that identify installer archives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedSuffixes(Vec<String>);

impl AcceptedSuffixes {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self(suffixes)
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.0.iter().any(|suffix| file_name.ends_with(suffix.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&ListingConfig> for AcceptedSuffixes {
    fn from(config: &ListingConfig) -> Self {
        Self::new(config.accepted_suffixes.clone())
    }
}

/// Accepts `<channel>.<minor>_...<suffix>` names, e.g. `515.1642_byond.exe` for channel `515`.
#[derive(Clone, Debug)]
pub struct BuildFilePattern {
    suffixes: AcceptedSuffixes,
    version: Regex,
}

impl BuildFilePattern {
    pub fn for_channel(channel_id: &str, suffixes: AcceptedSuffixes) -> Result<Self, MirrorError> {
        // The leading guard keeps channel 515 from matching 1515.x builds.
        let version = Regex::new(&format!(r"(?:^|[^0-9]){}\.\d+_", regex::escape(channel_id)))?;
        Ok(Self { suffixes, version })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes.matches(file_name) && self.version.is_match(file_name)
    }
}
