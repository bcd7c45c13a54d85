//! Where staybook keeps its files on each platform.

use std::path::PathBuf;

use crate::error::{Result, StaybookError};

const APP_DIR: &str = "staybook";

/// The configuration file, `~/.config/staybook/config.toml` on Linux.
pub fn config_file() -> Result<PathBuf> {
    Ok(app_dir(dirs::config_dir(), "config")?.join("config.toml"))
}

/// The file-backed session slot `name`, under `~/.local/share/staybook` on Linux.
///
/// The directory is not created here; the slot creates it on first save.
pub fn session_file(name: &str) -> Result<PathBuf> {
    Ok(app_dir(dirs::data_dir(), "data")?.join(format!("{name}.json")))
}

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| StaybookError::Config(format!("Cannot determine {kind} directory")))
}
