//! # Configuration
//!
//! Settings come from an optional TOML file, then command-line flags on top.
//!
//! ```toml
//! pipeline = "osito"
//! stage = "acceptance"
//! page_limit = 2
//! store = ".lastgreen.redb"
//! feed = "feed.json"
//! ```

use lastgreen_core::{FetcherConfig, LastGreenError, primitives::DEFAULT_PAGE_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "lastgreen.toml";

/// Cursor store location when neither the file nor the flags name one.
pub const DEFAULT_STORE_FILE: &str = ".lastgreen.redb";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub pipeline: Option<String>,
    pub stage: Option<String>,
    pub page_limit: Option<u32>,
    pub store: Option<PathBuf>,
    pub feed: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, LastGreenError> {
        toml::from_str(text).map_err(|e| LastGreenError::Config(e.to_string()))
    }

    /// Load a config file.
    ///
    /// An explicitly named file must exist. The default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LastGreenError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            LastGreenError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LastGreenError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            LastGreenError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::parse(&text)
    }
}

/// Values given on the command line. `Some` wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub pipeline: Option<String>,
    pub stage: Option<String>,
    pub page_limit: Option<u32>,
    pub store: Option<PathBuf>,
    pub feed: Option<PathBuf>,
}

/// Effective settings after merging file and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pipeline: Option<String>,
    pub stage: Option<String>,
    pub page_limit: u32,
    pub store: PathBuf,
    pub feed: Option<PathBuf>,
}

impl Settings {
    #[must_use]
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        Self {
            pipeline: overrides.pipeline.or(file.pipeline),
            stage: overrides.stage.or(file.stage),
            page_limit: overrides
                .page_limit
                .or(file.page_limit)
                .unwrap_or(DEFAULT_PAGE_LIMIT),
            store: overrides
                .store
                .or(file.store)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
            feed: overrides.feed.or(file.feed),
        }
    }

    /// Fetcher configuration; pipeline and stage must both be known.
    pub fn fetcher_config(&self) -> Result<FetcherConfig, LastGreenError> {
        let pipeline = self
            .pipeline
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| LastGreenError::Config("no pipeline configured".to_string()))?;
        let stage = self
            .stage
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LastGreenError::Config("no stage configured".to_string()))?;
        Ok(FetcherConfig::new(pipeline, stage).with_page_limit(self.page_limit))
    }

    /// The feed file; required by commands that poll.
    pub fn feed_path(&self) -> Result<&Path, LastGreenError> {
        self.feed
            .as_deref()
            .ok_or_else(|| LastGreenError::Config("no feed file configured".to_string()))
    }
}
