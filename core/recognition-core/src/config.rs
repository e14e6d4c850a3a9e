//! Session configuration loading.
//!
//! Configuration lives in `<config dir>/recognition/session.toml`. Every field
//! has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecognitionError, Result};
use crate::types::Orientation;

const CONFIG_DIR_NAME: &str = "recognition";
const CONFIG_FILE_NAME: &str = "session.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_continuous_autofocus")]
    pub continuous_autofocus: bool,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            continuous_autofocus: default_continuous_autofocus(),
            navigation: NavigationConfig::default(),
        }
    }
}

/// How a recognized object maps to a navigation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Joined with the object identifier when the object name is not itself a URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            allowed_schemes: default_allowed_schemes(),
        }
    }
}

fn default_continuous_autofocus() -> bool {
    true
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

/// Returns the default configuration file path.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(RecognitionError::ConfigDirNotFound)
}

/// Loads the session configuration, returning defaults if the file doesn't exist.
pub fn load_session_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No session config; using defaults");
        return Ok(SessionConfig::default());
    }

    let content =
        fs_err::read_to_string(&config_path).map_err(|source| RecognitionError::Io {
            context: format!("reading {}", config_path.display()),
            source,
        })?;
    parse_session_config(&content, &config_path)
}

fn parse_session_config(content: &str, path: &Path) -> Result<SessionConfig> {
    toml::from_str::<SessionConfig>(content).map_err(|err| RecognitionError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
