//! Configuration management for Capstream.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub revenue: RevenueConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hex-encoded ed25519 seed for the server's challenge-signing key.
    /// When absent, an ephemeral key is generated at startup.
    pub signing_key: Option<String>,
    pub network_passphrase: String,
    pub home_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_secs: u64,
    pub challenge_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueConfig {
    /// Percentage of each period's revenue that flows to the investor pool.
    pub share_percentage: f64,
    /// Total capital raised; the denominator for every investor's pool share.
    pub total_investment_pool: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                signing_key: None,
                network_passphrase: "Capstream Network ; 2024".to_string(),
                home_domain: "capstream.example".to_string(),
            },
            auth: AuthConfig {
                session_ttl_secs: 86_400,
                challenge_ttl_secs: 300,
            },
            revenue: RevenueConfig {
                share_percentage: 50.0,
                total_investment_pool: 400_000.0,
            },
            storage: StorageConfig {
                db_path: "data/capstream.db".to_string(),
            },
        }
    }
}
