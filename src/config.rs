// Configuration file handling.
//
// The YAML file holds the API base URL, the bearer token and the debug flag.
// It is read once at start-up into a `Config` value that is handed to the
// API client; `configure` rewrites only the token and leaves every other key
// (known or not) untouched.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::token::PROGRAM_NAME;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV: &str = "FLIGHT_CU_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The configuration file does not exist: {0}")]
    Missing(PathBuf),

    #[error("Failed to read the configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("The configuration file {0} does not set a base_url")]
    MissingBaseUrl(PathBuf),

    #[error("Failed to update the configuration file!\nPlease contact your system administrator for further assistance.")]
    Write(#[source] std::io::Error),

    #[error("Could not determine the configuration directory; pass --config or set FLIGHT_CU_CONFIG")]
    NoConfigDir,
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jwt_token: String,
    #[serde(default)]
    pub debug: bool,
}

// `jwt_token:` with no value is the same as no token at all.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The resolved values the API client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub debug: bool,
}

/// Where to find the configuration file: explicit path, `FLIGHT_CU_CONFIG`,
/// then `<config dir>/flight-cu/config.yaml`.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(PROGRAM_NAME).join("config.yaml"))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        // an empty file is an empty mapping, not an error
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Values for the API client; fails when no base URL is configured.
    pub fn client_config(&self, path: &Path) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::MissingBaseUrl(path.to_path_buf()))?;
        Ok(ClientConfig {
            base_url: base_url.to_string(),
            token: self.jwt_token.clone(),
            debug: self.debug,
        })
    }
}

/// Replace `jwt_token` in the file at `path`, preserving all other keys.
pub fn save_token(path: &Path, token: &str) -> Result<(), ConfigError> {
    let text = read(path)?;
    let mut doc: serde_yaml::Mapping = if text.trim().is_empty() {
        serde_yaml::Mapping::new()
    } else {
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    doc.insert("jwt_token".into(), token.into());

    let out = serde_yaml::to_string(&doc)
        .map_err(|e| ConfigError::Write(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    std::fs::write(path, out).map_err(ConfigError::Write)?;
    tracing::debug!(path = %path.display(), "updated jwt_token");
    Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
