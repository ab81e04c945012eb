mod config;

pub use config::{Config, ServerConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns the Beluga configuration directory, creating it if needed.
///
/// `BELUGA_CONFIG_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/beluga/`, or `~/.config/beluga-dev/` when `BELUGA_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("BELUGA_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("BELUGA_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("beluga-dev")
            } else {
                base_dir.join("beluga")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| CoreError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
