//! League configuration.
//!
//! Loaded from a TOML file whose path is taken from `PARITY_LEAGUE_CONFIG`; every
//! field has a default, so an empty file (or no file at all) is a valid config.
//!
//! ```toml
//! min_players = 4
//! min_referees = 1
//! start_wait_secs = 10
//! choice_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "PARITY_LEAGUE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeagueConfig {
    /// Endpoint the manager is reachable at.
    pub manager_endpoint: String,
    pub min_players: usize,
    pub min_referees: usize,
    /// Debounce window between the last qualifying registration and league start.
    pub start_wait_secs: u64,
    pub join_timeout_secs: u64,
    pub choice_timeout_secs: u64,
    /// Matches a referee accepts at once. `None` means unlimited.
    pub referee_max_concurrent_matches: Option<u32>,
    /// Per-request limit applied by the in-process network. `0` disables it.
    pub request_timeout_secs: u64,
    pub mailbox_capacity: usize,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            manager_endpoint: "local://league-manager".to_string(),
            min_players: 4,
            min_referees: 1,
            start_wait_secs: 10,
            join_timeout_secs: 5,
            choice_timeout_secs: 30,
            referee_max_concurrent_matches: None,
            request_timeout_secs: 0,
            mailbox_capacity: 32,
        }
    }
}

impl LeagueConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `PARITY_LEAGUE_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_players must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.join_timeout_secs == 0 || self.choice_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "join and choice timeouts must be positive".to_string(),
            ));
        }
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid(
                "mailbox_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn start_wait(&self) -> Duration {
        Duration::from_secs(self.start_wait_secs)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    pub fn choice_timeout(&self) -> Duration {
        Duration::from_secs(self.choice_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
