//! Configuration types for Rift Mocks.

mod listen;
mod mocks;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use listen::{AdminConfig, ListenConfig};
pub use mocks::{GlobalDelay, MocksConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Mock server listener
    #[serde(default)]
    pub server: ListenConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub mocks: MocksConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.mocks.delay < 0 {
            anyhow::bail!(
                "Invalid 'mocks.delay': {}. The global delay must be zero or positive",
                self.mocks.delay
            );
        }

        if let Some(collection) = &self.mocks.collection {
            if collection.trim().is_empty() {
                anyhow::bail!("'mocks.collection' must not be empty when set");
            }
        }

        if self.admin.enabled
            && self.admin.port == self.server.port
            && self.admin.host == self.server.host
        {
            anyhow::bail!(
                "Admin API and mock server cannot share {}:{}. Change 'admin.port' or disable the admin API",
                self.server.host,
                self.server.port
            );
        }

        Ok(())
    }
}
