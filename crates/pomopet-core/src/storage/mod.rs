mod config;
mod database;

pub use config::{CustomSound, Settings, SoundMode, SoundSettings, TimerSettings};
pub use database::{Database, DayStats, FocusRecord, StoredFocusRecord};

use std::path::PathBuf;

/// Returns `$POMOPET_DATA_DIR` if set, else `~/.config/pomopet/`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("POMOPET_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("pomopet"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
