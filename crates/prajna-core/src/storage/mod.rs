mod config;
pub mod database;
mod goals;
pub mod migrations;
mod sessions;
mod tags;

pub use config::{Config, NotificationsConfig, RecoveryConfig, StatsConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `PRAJNA_DATA_DIR` wins when set. Otherwise `~/.config/prajna[-dev]/`,
/// where `PRAJNA_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PRAJNA_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PRAJNA_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("prajna-dev")
            } else {
                base_dir.join("prajna")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
