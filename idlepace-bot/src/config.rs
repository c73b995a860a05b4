//! Endpoint, pacing and achievement files read at startup.
use idlepace_core::{AchievementCatalog, PacingConfig, PacingConfigError};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::agent::AgentIdentity;
use crate::channel::Endpoint;

pub const DEFAULT_ENDPOINTS_PATH: &str = "config/endpoints.json";
pub const DEFAULT_ACHIEVEMENTS_PATH: &str = "data/achievements.json";
pub const DEFAULT_STATE_DIR: &str = "config/account";
pub const DEFAULT_APP_ID: u32 = 730;
const DEFAULT_IPC_PORT: u16 = 1242;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid pacing configuration in {}", path.display())]
    Pacing {
        path: PathBuf,
        #[source]
        source: PacingConfigError,
    },
    #[error("{} does not list any bots", path.display())]
    NoBots { path: PathBuf },
    #[error("bot '{0}' is configured more than once")]
    DuplicateBot(String),
}

/// All endpoints and the bots behind them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsConfig {
    /// Credential shared by every endpoint unless one overrides it.
    #[serde(default, alias = "ipc_password")]
    pub ipc_password: String,
    #[serde(alias = "vps")]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(alias = "ip")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, alias = "ipc_password")]
    pub ipc_password: Option<String>,
    #[serde(default)]
    pub bots: Vec<String>,
}

const fn default_port() -> u16 {
    DEFAULT_IPC_PORT
}

impl EndpointsConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read(path)?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// One identity per configured bot, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if no bot is configured or a bot name repeats.
    pub fn identities(&self, path: &Path) -> Result<Vec<AgentIdentity>, ConfigError> {
        let mut seen = BTreeSet::new();
        let mut identities = Vec::new();
        for endpoint in &self.endpoints {
            let shared = Endpoint {
                host: endpoint.host.clone(),
                port: endpoint.port,
                password: endpoint
                    .ipc_password
                    .clone()
                    .unwrap_or_else(|| self.ipc_password.clone()),
            };
            for bot in &endpoint.bots {
                if !seen.insert(bot.as_str()) {
                    return Err(ConfigError::DuplicateBot(bot.clone()));
                }
                identities.push(AgentIdentity {
                    name: bot.clone(),
                    endpoint: shared.clone(),
                });
            }
        }
        if identities.is_empty() {
            return Err(ConfigError::NoBots {
                path: path.to_path_buf(),
            });
        }
        Ok(identities)
    }
}

/// Load and validate pacing constants, or the built-in tuning when `path` is `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_pacing(path: Option<&Path>) -> Result<PacingConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PacingConfig::load_from_static());
    };
    let raw = read(path)?;
    let pacing = PacingConfig::from_json(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    pacing.validate().map_err(|source| ConfigError::Pacing {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pacing)
}

/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_catalog(path: &Path) -> Result<AchievementCatalog, ConfigError> {
    let raw = read(path)?;
    AchievementCatalog::from_json(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
