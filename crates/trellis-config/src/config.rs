use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub realtime: RealtimeConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            realtime: RealtimeConfig::default(),
            storage: StorageConfig::default(),
            uploads: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Look up a value by dotted key, e.g. `"realtime.base_url"`
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["realtime", "base_url"] => Some(self.realtime.base_url.clone()),
            ["realtime", "auto_connect"] => Some(self.realtime.auto_connect.to_string()),
            ["storage", "backend"] => Some(self.storage.backend.as_str().to_string()),
            ["storage", "endpoint"] => self.storage.endpoint.clone(),
            ["uploads", "max_files"] => Some(self.uploads.max_files.to_string()),
            ["uploads", "max_file_bytes"] => Some(self.uploads.max_file_bytes.to_string()),
            ["uploads", "public_base_url"] => Some(self.uploads.public_base_url.clone()),
            ["logging", "level"] => Some(format!("{:?}", self.logging.level)),
            ["logging", "file"] => self.logging.file.clone(),
            _ => None,
        }
    }

    /// Set a value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["realtime", "base_url"] => {
                self.realtime.base_url = value.to_string();
            }
            ["realtime", "auto_connect"] => {
                self.realtime.auto_connect = value
                    .parse()
                    .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))?;
            }
            ["storage", "backend"] => {
                self.storage.backend = value.parse()?;
            }
            ["storage", "endpoint"] => {
                self.storage.endpoint = Some(value.to_string());
            }
            ["uploads", "max_files"] => {
                self.uploads.max_files = value
                    .parse()
                    .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))?;
            }
            ["uploads", "max_file_bytes"] => {
                self.uploads.max_file_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))?;
            }
            ["uploads", "public_base_url"] => {
                self.uploads.public_base_url = value.to_string();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            _ => {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        self.realtime.validate()?;
        self.storage.validate()?;
        if self.uploads.max_files == 0 {
            return Err(ConfigError::Validation(
                "uploads.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Realtime connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeConfig {
    /// Origin shared by all role endpoints
    pub base_url: String,
    /// Whether connections open on construction. Off by default: views
    /// open their connection explicitly when they bind.
    pub auto_connect: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            auto_connect: false,
        }
    }
}

impl RealtimeConfig {
    /// Environment variable overriding the configured base url
    pub const BASE_URL_ENV: &'static str = "TRELLIS_REALTIME_URL";

    /// Build from defaults plus environment override
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(Self::BASE_URL_ENV) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.starts_with("http://")
            && !self.base_url.starts_with("https://")
            && !self.base_url.starts_with("ws://")
            && !self.base_url.starts_with("wss://")
        {
            return Err(ConfigError::Validation(format!(
                "Invalid realtime base url: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// API origin for the remote backend; unused by the memory backend
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            endpoint: None,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend == StorageBackend::Remote && self.endpoint.is_none() {
            return Err(ConfigError::Validation(
                "storage.endpoint is required for the remote backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which store implementation backs the record collections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process reference backend, no persistence
    Memory,
    /// Platform API backend reached over `storage.endpoint`
    Remote,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Remote => "remote",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "remote" => Ok(StorageBackend::Remote),
            other => Err(ConfigError::Validation(format!(
                "Invalid storage backend: {}",
                other
            ))),
        }
    }
}

/// Upload constraints applied by the upload collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_bytes: u64,
    pub allowed_extensions: Vec<String>,
    /// Base url prefixed to stored paths to form retrievable urls
    pub public_base_url: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_bytes: 5 * 1024 * 1024,
            allowed_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "pdf".to_string(),
            ],
            public_base_url: "http://localhost:4000/uploads".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Optional log file path; stderr when absent
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ConfigError::Validation(format!("Invalid log level: {}", other))),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
