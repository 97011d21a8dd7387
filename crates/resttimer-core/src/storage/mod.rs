mod config;
pub mod database;

pub use config::{AdjustConfig, Config, HistoryConfig, TimerConfig, WarningsConfig};
pub use database::{Database, RestStats};

use std::path::PathBuf;

/// Returns `~/.config/resttimer[-dev]/` based on RESTTIMER_ENV.
///
/// Set RESTTIMER_ENV=dev to use the development data directory, or
/// RESTTIMER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("RESTTIMER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("RESTTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("resttimer-dev")
            } else {
                base_dir.join("resttimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
