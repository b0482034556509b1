//! Configuration Module
//!
//! Handles loading store and server configuration from environment variables.

use std::env;
use std::time::Duration;

use redis::{ConnectionInfo, IntoConnectionInfo, RedisResult};

/// Address scheme selecting the in-process transport.
pub const MEMORY_SCHEME: &str = "memory://";

// == Transport Options ==
/// Options handed to the store transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Target `host:port`, or a full `redis://` URL
    pub address: String,
    /// Database index selected on connect
    pub db: i64,
    /// Optional AUTH password
    pub password: Option<String>,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Time allowed for the server to answer a command
    pub response_timeout: Duration,
}

impl TransportOptions {
    /// Options for `address` with default tuning.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            db: 0,
            password: None,
            connect_timeout: Duration::from_millis(5000),
            response_timeout: Duration::from_millis(3000),
        }
    }

    /// True when the address selects the in-process transport.
    pub fn is_memory(&self) -> bool {
        self.address.starts_with(MEMORY_SCHEME)
    }

    /// Connection URL for the address, without credentials.
    pub fn redis_url(&self) -> String {
        if self.address.contains("://") {
            return self.address.clone();
        }
        format!("redis://{}/{}", self.address, self.db)
    }

    /// Connection settings for the redis client. The password is set on the
    /// parsed settings, never spliced into the URL, so it needs no escaping.
    pub fn connection_info(&self) -> RedisResult<ConnectionInfo> {
        let mut info = self.redis_url().as_str().into_connection_info()?;
        if let Some(password) = &self.password {
            info.redis.password = Some(password.clone());
        }
        Ok(info)
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new("localhost:6379")
    }
}

// == Config ==
/// Process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store transport options
    pub transport: TransportOptions,
    /// Deadline applied to each HTTP request's cache call
    pub request_timeout: Duration,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ADDRESS` - Store address (default: localhost:6379, `memory://` for in-process)
    /// - `CACHE_DB` - Database index (default: 0)
    /// - `CACHE_PASSWORD` - AUTH password (default: unset)
    /// - `CACHE_CONNECT_TIMEOUT_MS` - Connect timeout (default: 5000)
    /// - `CACHE_RESPONSE_TIMEOUT_MS` - Response timeout (default: 3000)
    /// - `CACHE_REQUEST_TIMEOUT_MS` - Per-request deadline (default: 2000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transport: TransportOptions {
                address: env::var("CACHE_ADDRESS").unwrap_or(defaults.transport.address),
                db: parse_var("CACHE_DB").unwrap_or(defaults.transport.db),
                password: env::var("CACHE_PASSWORD").ok().filter(|p| !p.is_empty()),
                connect_timeout: parse_var("CACHE_CONNECT_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.transport.connect_timeout),
                response_timeout: parse_var("CACHE_RESPONSE_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.transport.response_timeout),
            },
            request_timeout: parse_var("CACHE_REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportOptions::default(),
            request_timeout: Duration::from_millis(2000),
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.transport.address, "localhost:6379");
        assert_eq!(config.transport.db, 0);
        assert!(config.transport.password.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_ADDRESS");
        env::remove_var("CACHE_DB");
        env::remove_var("CACHE_PASSWORD");
        env::remove_var("CACHE_CONNECT_TIMEOUT_MS");
        env::remove_var("CACHE_RESPONSE_TIMEOUT_MS");
        env::remove_var("CACHE_REQUEST_TIMEOUT_MS");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.transport, TransportOptions::default());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_redis_url() {
        let mut options = TransportOptions::new("localhost:6379");
        assert_eq!(options.redis_url(), "redis://localhost:6379/0");

        options.db = 2;
        options.password = Some("secret".to_string());
        assert_eq!(options.redis_url(), "redis://localhost:6379/2");

        let options = TransportOptions::new("rediss://cache.internal:6380/1");
        assert_eq!(options.redis_url(), "rediss://cache.internal:6380/1");
    }

    #[test]
    fn test_connection_info_keeps_password_verbatim() {
        let mut options = TransportOptions::new("localhost:6379");
        options.db = 2;
        options.password = Some("p@ss/:w#rd".to_string());

        let info = options.connection_info().unwrap();
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/:w#rd"));
        assert_eq!(info.redis.db, 2);
        assert_eq!(
            info.addr,
            redis::ConnectionAddr::Tcp("localhost".to_string(), 6379)
        );
    }

    #[test]
    fn test_memory_scheme() {
        assert!(TransportOptions::new("memory://").is_memory());
        assert!(!TransportOptions::default().is_memory());
    }
}
