//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chat::{HubConfig, SessionConfig, DEFAULT_ROOM};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (empty = any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Rooms, hubs and sessions
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_room")]
    pub default_room: String,

    #[serde(default = "default_room_capacity")]
    pub default_room_capacity: usize,

    /// Reject joins once a room is at capacity
    #[serde(default = "default_enforce_capacity")]
    pub enforce_capacity: bool,

    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

fn default_room_capacity() -> usize {
    100
}

fn default_enforce_capacity() -> bool {
    true
}

fn default_mailbox_capacity() -> usize {
    1024
}

fn default_outbound_queue_capacity() -> usize {
    256
}

fn default_max_message_size() -> usize {
    4096
}

fn default_write_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_ping_interval() -> u64 {
    54
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_room: default_room(),
            default_room_capacity: default_room_capacity(),
            enforce_capacity: default_enforce_capacity(),
            mailbox_capacity: default_mailbox_capacity(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            max_message_size: default_max_message_size(),
            write_timeout_ms: default_write_timeout(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

impl ChatConfig {
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            mailbox_capacity: self.mailbox_capacity,
            enforce_capacity: self.enforce_capacity,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            outbound_capacity: self.outbound_queue_capacity,
            max_message_size: self.max_message_size,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            ping_interval: Duration::from_secs(self.ping_interval_secs),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chatroom").join("config.toml")),
            Some(PathBuf::from("/etc/chatroom/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.default_room.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "chat.default_room must not be blank".to_string(),
            ));
        }
        if self.chat.default_room_capacity == 0 {
            return Err(ConfigError::Invalid(
                "chat.default_room_capacity must be at least 1".to_string(),
            ));
        }
        if self.chat.mailbox_capacity == 0 || self.chat.outbound_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "chat queue capacities must be at least 1".to_string(),
            ));
        }
        if self.chat.ping_interval_secs == 0 || self.chat.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "chat.ping_interval_secs and chat.write_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(host) = std::env::var("CHATROOM_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CHATROOM_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Chat overrides
        if let Ok(room) = std::env::var("CHATROOM_DEFAULT_ROOM") {
            self.chat.default_room = room;
        }
        if let Ok(capacity) = std::env::var("CHATROOM_DEFAULT_ROOM_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.chat.default_room_capacity = c;
            }
        }
        if let Ok(enforce) = std::env::var("CHATROOM_ENFORCE_CAPACITY") {
            self.chat.enforce_capacity = enforce.to_lowercase() != "false" && enforce != "0";
        }

        // Logging overrides
        if let Ok(level) = std::env::var("CHATROOM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CHATROOM_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Chatroom Configuration
#
# Environment variables override these settings:
# - CHATROOM_HOST
# - CHATROOM_PORT
# - CHATROOM_DEFAULT_ROOM
# - CHATROOM_DEFAULT_ROOM_CAPACITY
# - CHATROOM_ENFORCE_CAPACITY
# - CHATROOM_LOG_LEVEL
# - CHATROOM_LOG_FORMAT

[server]
# HTTP server host
host = "0.0.0.0"

# HTTP server port
port = 8080

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[chat]
# Room used when a client does not name one; created at startup
default_room = "general"
default_room_capacity = 100

# Reject joins once a room reaches its capacity
enforce_capacity = true

# Pending events per room hub
mailbox_capacity = 1024

# Pending outgoing messages per client; a client whose queue fills up is disconnected
outbound_queue_capacity = 256

# Largest accepted message (bytes)
max_message_size = 4096

# Deadline for writing one message to a client (ms)
write_timeout_ms = 10000

# Keepalive ping interval (seconds)
ping_interval_secs = 54

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
