//! Configuration file parser for `config.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
//!
//! After loading, [`Config::apply_env`] lets the process environment (and the
//! `.env` file) override the database path and the secrets.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::env_file::EnvVars;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub templates: TemplatesConfig,
    pub migration: MigrationConfig,
    pub image: ImageConfig,
    pub auth: AuthConfig,
    pub openai: OpenAiConfig,
    /// Path of the `KEY=VALUE` file read at startup.
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/newsdesk.db".to_string(),
        }
    }
}

/// Where static assets are read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Read from an S3 bucket instead of the local `base_path`.
    pub use_s3: bool,
    pub region: String,
    pub bucket: String,
    /// Local directory for static files.
    pub base_path: PathBuf,
    /// Custom S3-compatible endpoint (path-style addressing).
    pub endpoint: Option<String>,
    /// Number of S3 objects kept in memory. 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_s3: false,
            region: "us-east-1".to_string(),
            bucket: String::new(),
            base_path: PathBuf::from("static"),
            endpoint: None,
            cache_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for the log file. Empty disables file logging.
    pub dir: String,
    /// Log file name; prefixed with the start timestamp.
    pub file: String,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file: "newsdesk.log".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub path: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("templates"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub path: PathBuf,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("migrations"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Prefix joined onto relative article image paths.
    pub base_url: String,
    /// Image used for generated articles.
    pub default_image: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "/static/".to_string(),
            default_image: "images/placeholder.svg".to_string(),
        }
    }
}

/// Custom Debug impl masks `jwt_secret`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret (alternative to JWT_SECRET env var).
    pub jwt_secret: Option<String>,
    pub bcrypt_cost: u32,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            token_ttl_hours: 24,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Custom Debug impl masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (alternative to OPENAI_API_KEY env var). Generation is
    /// disabled without one.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "server",
        "database",
        "storage",
        "log",
        "templates",
        "migration",
        "image",
        "auth",
        "openai",
        "env_file",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown top-level keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment overrides. Env vars take precedence over the file.
    ///
    /// - `DATABASE_PATH` → `database.path`
    /// - `JWT_SECRET` → `auth.jwt_secret`
    /// - `OPENAI_API_KEY` → `openai.api_key`
    pub fn apply_env(&mut self, env: &EnvVars) {
        if let Some(path) = env.get("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(secret) = env.get("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(key) = env.get("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
