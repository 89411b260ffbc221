use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::retry::RetryPolicy;

/// Unprefixed environment variables honoured on top of the config file,
/// paired with the config key each one overrides.
const WELL_KNOWN_ENV: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("HOST", "server.host"),
    ("DATABASE_URL", "storage.database_url"),
    ("MESSAGING_URL", "messaging.url"),
    ("NOTIFY_SOCKET", "supervisor.notify_socket"),
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HostConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Address the status server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the status server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Grace period for in-flight requests once the listener stops accepting
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Connection string; falls back to a sqlite file under `data_dir`
    pub database_url: Option<String>,

    /// Directory holding the default sqlite database
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Connection attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Deadline for a single connection attempt
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagingConfig {
    /// Gateway endpoint of the messaging client (ws:// or wss://)
    pub url: Option<String>,

    #[serde(default = "default_messaging_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_messaging_disconnect_timeout")]
    pub disconnect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SupervisorConfig {
    /// sd_notify socket handed to us by the service manager
    pub notify_socket: Option<String>,
}

impl HostConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load configuration resolving the well-known variables through `lookup`
    pub fn load_with_env<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.drain_timeout_secs", default_drain_timeout())?
            .set_default("storage.data_dir", default_data_dir())?
            .set_default("storage.max_attempts", default_max_attempts() as i64)?
            .set_default("storage.base_delay_ms", default_base_delay())?
            .set_default("storage.max_delay_ms", default_max_delay())?
            .set_default("storage.connect_timeout_secs", default_connect_timeout())?
            .set_default(
                "messaging.connect_timeout_secs",
                default_messaging_connect_timeout(),
            )?
            .set_default(
                "messaging.disconnect_timeout_secs",
                default_messaging_disconnect_timeout(),
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with BOTHOST__ prefix
            .add_source(
                Environment::with_prefix("BOTHOST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in WELL_KNOWN_ENV {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            if value.is_some() {
                debug!("{} overrides {}", var, key);
            }
            builder = builder.set_override_option(*key, value)?;
        }

        let config: HostConfig = builder.build()?.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Message(
                "Server host must not be empty".to_string(),
            ));
        }

        if self.storage.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Storage max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.storage.base_delay_ms > self.storage.max_delay_ms {
            return Err(ConfigError::Message(
                "Storage base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }

        if self.storage.connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Storage connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.messaging.connect_timeout_secs == 0 || self.messaging.disconnect_timeout_secs == 0
        {
            return Err(ConfigError::Message(
                "Messaging timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string the status server binds to
    pub fn bind_address(&self) -> String {
        match self.server.host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.server.port).to_string(),
            Err(_) => format!("{}:{}", self.server.host, self.server.port),
        }
    }
}

impl StorageConfig {
    /// Connection string to use, substituting the local sqlite default
    pub fn resolved_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite:{}/database.db",
                self.data_dir.trim_end_matches('/')
            ),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl MessagingConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout_secs)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                drain_timeout_secs: default_drain_timeout(),
            },
            storage: StorageConfig {
                database_url: None,
                data_dir: default_data_dir(),
                max_attempts: default_max_attempts(),
                base_delay_ms: default_base_delay(),
                max_delay_ms: default_max_delay(),
                connect_timeout_secs: default_connect_timeout(),
            },
            messaging: MessagingConfig {
                url: None,
                connect_timeout_secs: default_messaging_connect_timeout(),
                disconnect_timeout_secs: default_messaging_disconnect_timeout(),
            },
            supervisor: SupervisorConfig::default(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_drain_timeout() -> u64 {
    5
}

fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    500
}
fn default_max_delay() -> u64 {
    5000
}
fn default_connect_timeout() -> u64 {
    10
}

fn default_messaging_connect_timeout() -> u64 {
    30
}
fn default_messaging_disconnect_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.storage.max_attempts, 3);
        assert_eq!(config.storage.resolved_url(), "sqlite:./data/database.db");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config =
            HostConfig::load_with_env("/nonexistent/bothost.toml", env_of(&[])).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.storage.database_url.is_none());
        assert!(config.messaging.url.is_none());
        assert!(config.supervisor.notify_socket.is_none());
    }

    #[test]
    fn test_load_outside_service_manager_is_valid() {
        let config =
            HostConfig::load_with_env("/nonexistent/bothost.toml", |_: &str| None).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.storage.resolved_url(), "sqlite:./data/database.db");
        assert!(config.supervisor.notify_socket.is_none());
    }

    #[test]
    fn test_bind_address_handles_ipv6() {
        let mut config = HostConfig::default();

        config.server.host = "::".to_string();
        assert_eq!(config.bind_address(), "[::]:3000");
        assert!(config.bind_address().parse::<SocketAddr>().is_ok());

        config.server.host = "::1".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "[::1]:8080");

        config.server.host = "localhost".to_string();
        assert_eq!(config.bind_address(), "localhost:8080");
    }

    #[test]
    fn test_well_known_env_overrides() {
        let config = HostConfig::load_with_env(
            "/nonexistent/bothost.toml",
            env_of(&[
                ("PORT", "8081"),
                ("HOST", "127.0.0.1"),
                ("DATABASE_URL", "sqlite:./data/app.db"),
                ("MESSAGING_URL", "ws://127.0.0.1:9000/gateway"),
                ("NOTIFY_SOCKET", "/run/systemd/notify"),
            ]),
        )
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert_eq!(config.storage.resolved_url(), "sqlite:./data/app.db");
        assert_eq!(
            config.messaging.url.as_deref(),
            Some("ws://127.0.0.1:9000/gateway")
        );
        assert_eq!(
            config.supervisor.notify_socket.as_deref(),
            Some("/run/systemd/notify")
        );
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = HostConfig::load_with_env(
            "/nonexistent/bothost.toml",
            env_of(&[("DATABASE_URL", "  ")]),
        )
        .unwrap();
        assert!(config.storage.database_url.is_none());
    }

    #[test]
    fn test_file_values_are_overridden_by_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 4000\n\n[storage]\nmax_attempts = 5\ndata_dir = \"/var/lib/bothost\""
        )
        .unwrap();

        let config = HostConfig::load_with_env(file.path(), env_of(&[("PORT", "4100")])).unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.storage.max_attempts, 5);
        assert_eq!(
            config.storage.resolved_url(),
            "sqlite:/var/lib/bothost/database.db"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();

        config.storage.max_attempts = 0;
        assert!(config.validate().is_err());
        config.storage.max_attempts = 3;

        config.storage.base_delay_ms = 10_000;
        assert!(config.validate().is_err());
        config.storage.base_delay_ms = 500;

        config.messaging.disconnect_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.messaging.disconnect_timeout_secs = 5;

        assert!(config.validate().is_ok());
    }
}
