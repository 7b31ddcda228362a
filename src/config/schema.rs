//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub roles: RoleCacheConfig,
}

/// Remote REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Local identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Where accounts and the signed-in user are kept between runs.
    /// When unset the provider is purely in-memory.
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// HMAC secret used to sign id tokens
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    /// Lifetime of a minted id token
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_secret() -> String {
    "donorlink-secret-key-change-in-production".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Persisted local storage (the browser's localStorage equivalent)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON file backing the store; in-memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Role lookup cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCacheConfig {
    /// How long a fetched role is served without a network round trip
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,

    /// How long an unused entry is kept at all
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,

    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_stale_time_secs() -> u64 {
    300
}

fn default_gc_time_secs() -> u64 {
    1800
}

fn default_max_entries() -> u64 {
    1000
}

impl Default for RoleCacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
            gc_time_secs: default_gc_time_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl RoleCacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    /// Entries are never collected before they go stale
    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs.max(self.stale_time_secs))
    }
}

impl IdentityConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
