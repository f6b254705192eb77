//! Bot configuration
//!
//! Everything is read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Author recorded on listings that are marked for repeated publishing
pub const SYSTEM_AUTHOR: &str = "Granxy";

/// Nickname of the active account when nobody is signed in
pub const GUEST_NICKNAME: &str = "Guest";

/// Seed and system accounts hidden from operator-facing user listings
pub const RESERVED_NICKNAMES: [&str; 4] = ["johndoe", "admin", "tester", "granxy"];

const DEFAULT_OPERATOR: &str = "Pbeta2025";
const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Delays between consecutive messages of a multi-message reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub user_details: Duration,
    pub published_apps: Duration,
    pub sync_list: Duration,
}

impl Pacing {
    #[allow(dead_code)] // Used by tests
    pub const fn none() -> Self {
        Self {
            user_details: Duration::ZERO,
            published_apps: Duration::ZERO,
            sync_list: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            user_details: Duration::from_millis(1000),
            published_apps: Duration::from_millis(500),
            sync_list: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Username allowed to operate the bot (compared case-insensitively)
    pub operator: String,
    pub db_path: PathBuf,
    pub api_base: String,
    /// Explicit forwarding target; falls back to the operator's chat
    pub forward_chat: Option<i64>,
    pub poll_timeout: Duration,
    pub retry_delay: Duration,
    pub pacing: Pacing,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("GRANXY_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("GRANXY_BOT_TOKEN"))?;

        let db_path = lookup("GRANXY_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.granxy/granxy.db"))
            },
            PathBuf::from,
        );

        let forward_chat = match lookup("GRANXY_FORWARD_CHAT") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "GRANXY_FORWARD_CHAT",
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(Self {
            token,
            operator: lookup("GRANXY_OPERATOR").unwrap_or_else(|| DEFAULT_OPERATOR.to_string()),
            db_path,
            api_base: lookup("GRANXY_API_BASE")
                .map_or_else(|| DEFAULT_API_BASE.to_string(), |b| b.trim_end_matches('/').to_string()),
            forward_chat,
            poll_timeout: seconds(&lookup, "GRANXY_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?,
            retry_delay: seconds(&lookup, "GRANXY_RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY_SECS)?,
            pacing: Pacing::default(),
        })
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(Duration::from_secs(default)),
    }
}
