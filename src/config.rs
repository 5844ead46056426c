use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{pubkey::Pubkey, signature::Keypair};

use crate::error::ConfigError;
use crate::helper::{parse_keypair, parse_pubkey};

pub const DEFAULT_RECIPIENT: &str = "EhAe53YAbJMXCA2PVHVmhMrtihBnZof2UVoKDt1bUJdD";
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Reward minting setup. Absent when no authority secret is configured.
pub struct RewardConfig {
    pub mint: Pubkey,
    pub authority: Arc<Keypair>,
}

pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub rpc_url: String,
    pub rpc_timeout: Duration,
    pub default_recipient: Pubkey,
    pub explorer_cluster: String,
    pub reward: Option<RewardConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => u16::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };
        let base_url = get("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let rpc_url = get("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_timeout = match get("RPC_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(
                |e: std::num::ParseIntError| ConfigError::Invalid {
                    key: "RPC_TIMEOUT_SECS",
                    reason: e.to_string(),
                },
            )?),
            None => Duration::from_secs(30),
        };

        let default_recipient = pubkey_var(
            "DEFAULT_RECIPIENT",
            get("DEFAULT_RECIPIENT").as_deref().unwrap_or(DEFAULT_RECIPIENT),
        )?;
        let explorer_cluster = get("EXPLORER_CLUSTER").unwrap_or_else(|| "devnet".to_string());

        let reward = match get("MINT_AUTHORITY_SECRET") {
            Some(secret) => {
                let authority = parse_keypair(&secret).map_err(|e| ConfigError::Invalid {
                    key: "MINT_AUTHORITY_SECRET",
                    reason: e.to_string(),
                })?;
                let mint = get("REWARD_MINT").ok_or(ConfigError::Invalid {
                    key: "REWARD_MINT",
                    reason: "required when MINT_AUTHORITY_SECRET is set".to_string(),
                })?;
                let mint = pubkey_var("REWARD_MINT", &mint)?;
                Some(RewardConfig {
                    mint,
                    authority: Arc::new(authority),
                })
            }
            None => None,
        };

        Ok(AppConfig {
            host,
            port,
            base_url,
            rpc_url,
            rpc_timeout,
            default_recipient,
            explorer_cluster,
            reward,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn pubkey_var(key: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    parse_pubkey(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
