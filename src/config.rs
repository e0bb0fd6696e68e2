use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where the archive lives.
///
/// ```toml
/// supabase_url = "https://xyz.supabase.co"
/// supabase_key = "anon key"
/// # sqlite_path = "/path/to/archive.db"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub sqlite_path: Option<PathBuf>,
}

impl Settings {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "family-archive").map(|d| d.config_dir().join(CONFIG_FILE))
    }

    /// Load settings from a file. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values given on the command line or in the environment
    pub fn merge(self, overrides: Settings) -> Self {
        Self {
            supabase_url: overrides.supabase_url.or(self.supabase_url),
            supabase_key: overrides.supabase_key.or(self.supabase_key),
            sqlite_path: overrides.sqlite_path.or(self.sqlite_path),
        }
    }

    /// Resolve the effective settings: `overrides` beat the config file
    pub fn resolve(config_path: Option<&Path>, overrides: Settings) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };
        Ok(file.merge(overrides))
    }
}
