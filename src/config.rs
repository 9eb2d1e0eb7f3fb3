//! Server configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! server listening on `0.0.0.0:9000` that serves pages from `www` and files
//! relative to the working directory.
//!
//! ```toml
//! listen = "127.0.0.1:9000"
//! www_dir = "www"
//! file_root = "."
//!
//! [github]
//! api_base = "https://api.github.com/"
//! timeout_secs = 20
//!
//! [limits.server]
//! concurrency = { workers = 8 }
//! ```

use crate::limits::Limits;
use serde::Deserialize;
use std::{
    fs, io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the listener binds to (default: `0.0.0.0:9000`).
    pub listen: SocketAddr,
    /// Directory holding `root.html` and `index.html`, also the directory
    /// listed on the root page (default: `www`).
    pub www_dir: PathBuf,
    /// Directory the `file/` endpoint resolves paths against (default: `.`).
    pub file_root: PathBuf,
    pub github: GithubConfig,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 9000)),
            www_dir: PathBuf::from("www"),
            file_root: PathBuf::from("."),
            github: GithubConfig::default(),
            limits: Limits::default(),
        }
    }
}

/// Outbound GitHub API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Prefix the `query` parameter is appended to
    /// (default: `https://api.github.com/`).
    pub api_base: String,
    /// Whole-request timeout in seconds (default: `20`).
    pub timeout_secs: u64,
    /// `User-Agent` sent upstream; GitHub rejects requests without one.
    pub user_agent: String,
}

impl GithubConfig {
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com/".to_owned(),
            timeout_secs: 20,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("`limits.server.concurrency` must have at least one worker")]
    NoWorkers,
    #[error("`github.timeout_secs` must be at least 1")]
    ZeroTimeout,
    #[error("cannot build the GitHub client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;

    let config: Config = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let crate::limits::Concurrency::Workers(0) = self.limits.server.concurrency {
            return Err(ConfigError::NoWorkers);
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}
