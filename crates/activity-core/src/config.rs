use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ActivityError, Result};

/// Top-level application configuration, loaded from TOML.
///
/// The file carries platform credentials and is required: a missing or
/// unparseable file is a fatal `Config` error raised before any platform
/// call is made.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub platform: PlatformConfig,
}

/// Chat platform connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform API, e.g. "https://chat.example.com".
    pub host: String,
    /// Bearer token sent with every call.
    pub auth_token: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            auth_token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ActivityError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ActivityError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.platform.host.trim().is_empty() {
            return Err(ActivityError::Config("platform.host is not set".into()));
        }
        if self.platform.auth_token.trim().is_empty() {
            return Err(ActivityError::Config("platform.auth_token is not set".into()));
        }
        Ok(())
    }
}
