pub mod config;
pub mod logging;
pub mod manager;

pub use config::{
    Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, RealtimeConfig, StorageBackend,
    StorageConfig, UploadConfig,
};
pub use logging::init_logging;
pub use manager::ConfigManager;

use std::path::PathBuf;

/// Trellis configuration directory (~/.trellis)
pub fn trellis_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".trellis"))
}

/// Default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    trellis_dir().map(|dir| dir.join("config.json"))
}

/// Default directory for uploaded files
pub fn default_uploads_dir() -> Option<PathBuf> {
    trellis_dir().map(|dir| dir.join("uploads"))
}

/// Default log file path
pub fn default_log_path() -> Option<PathBuf> {
    trellis_dir().map(|dir| dir.join("logs").join("trellis.log"))
}

/// Create the Trellis directory layout
pub async fn init_trellis_dirs() -> ConfigResult<()> {
    if let Some(trellis) = trellis_dir() {
        tokio::fs::create_dir_all(&trellis).await?;
        tokio::fs::create_dir_all(trellis.join("uploads")).await?;
        tokio::fs::create_dir_all(trellis.join("logs")).await?;
    }
    Ok(())
}
