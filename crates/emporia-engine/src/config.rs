//! # Engine Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use emporia_core::LOW_STOCK_THRESHOLD;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Maximum database pool connections.
    pub max_connections: u32,

    /// Idle timeout after which a session cart expires, in seconds.
    pub session_idle_secs: u64,

    /// Email domain used for phone-only guest signups
    /// (`{phone}@{domain}`).
    pub guest_email_domain: String,

    /// Fixed default password assigned to guest signups.
    pub guest_default_password: String,

    /// Shop stock level at or below which POS sales warn.
    pub low_stock_threshold: i64,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = EngineConfig {
            database_path: env::var("EMPORIA_DB_PATH")
                .unwrap_or_else(|_| "./emporia.db".to_string()),

            max_connections: env::var("EMPORIA_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMPORIA_MAX_CONNECTIONS".to_string()))?,

            session_idle_secs: env::var("EMPORIA_SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "1800".to_string()) // 30 minutes
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMPORIA_SESSION_IDLE_SECS".to_string()))?,

            guest_email_domain: env::var("EMPORIA_GUEST_DOMAIN")
                .unwrap_or_else(|_| "guest.local".to_string()),

            guest_default_password: env::var("EMPORIA_GUEST_PASSWORD")
                // Development default; set via environment in production
                .unwrap_or_else(|_| "emporia-guest".to_string()),

            low_stock_threshold: env::var("EMPORIA_LOW_STOCK_THRESHOLD")
                .unwrap_or_else(|_| LOW_STOCK_THRESHOLD.to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("EMPORIA_LOW_STOCK_THRESHOLD".to_string())
                })?,
        };

        Ok(config)
    }

    /// The session idle timeout as a Duration.
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: "./emporia.db".to_string(),
            max_connections: 5,
            session_idle_secs: 1800,
            guest_email_domain: "guest.local".to_string(),
            guest_default_password: "emporia-guest".to_string(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.low_stock_threshold, 2);
        assert_eq!(config.guest_email_domain, "guest.local");
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(1800));
    }
}
