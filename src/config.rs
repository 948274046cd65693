//! Configuration loading for threadsync.
//!
//! Lives at `~/.config/threadsync/config.toml` unless an explicit path is
//! given. The API section is written back when a token refresh rotates the
//! credential pair.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, OAuth2Tokens};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Hard bound on ancestors fetched per chain walk.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    /// Wait applied to an endpoint with no observed quota headers yet.
    /// The default matches the tightest documented tier limit.
    #[serde(default = "default_fallback_wait_secs")]
    pub fallback_wait_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub threads_dir: Option<PathBuf>,
}

const fn default_max_results() -> u32 {
    50
}

const fn default_max_chain_depth() -> usize {
    20
}

const fn default_fallback_wait_secs() -> u64 {
    900
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
            fallback_wait_secs: default_fallback_wait_secs(),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let Some(config_dir) = dirs::config_dir() else {
            bail!("could not determine the config directory for this platform");
        };
        Ok(config_dir.join("threadsync").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config dir {}", parent.display()))?;
        }
        fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.api.client_id.clone(),
            client_secret: self.api.client_secret.clone(),
        }
    }

    pub fn tokens(&self) -> OAuth2Tokens {
        OAuth2Tokens {
            access_token: self.api.access_token.clone(),
            refresh_token: self.api.refresh_token.clone(),
        }
    }

    pub fn set_tokens(&mut self, tokens: &OAuth2Tokens) {
        self.api.access_token = tokens.access_token.clone();
        self.api.refresh_token = tokens.refresh_token.clone();
    }

    pub fn fallback_wait(&self) -> Duration {
        Duration::from_secs(self.sync.fallback_wait_secs)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("threadsync")
        })
    }

    pub fn threads_dir(&self) -> PathBuf {
        self.storage
            .threads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("threads"))
    }
}
