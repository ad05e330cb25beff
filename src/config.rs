use std::collections::HashMap;
use thiserror::Error;

/// Longest countdown a live auction may be configured with, in seconds.
const MAX_BID_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub auction_bid_window_secs: u64,
    pub auction_mailbox_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let auction_bid_window_secs = env_map
            .get("AUCTION_BID_WINDOW_SECS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<u64>()
            .ok()
            .filter(|secs| (1..=MAX_BID_WINDOW_SECS).contains(secs))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AUCTION_BID_WINDOW_SECS".to_string(),
                    format!("must be between 1 and {}", MAX_BID_WINDOW_SECS),
                )
            })?;

        let auction_mailbox_size = env_map
            .get("AUCTION_MAILBOX_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("64")
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AUCTION_MAILBOX_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            auction_bid_window_secs,
            auction_mailbox_size,
        })
    }

    /// Countdown restarted by every accepted live bid.
    pub fn auction_bid_window(&self) -> chrono::Duration {
        // Bounded by MAX_BID_WINDOW_SECS at load time.
        chrono::Duration::seconds(self.auction_bid_window_secs.min(MAX_BID_WINDOW_SECS) as i64)
    }
}
