//! Configuration management for staybook.

pub mod paths;
pub mod settings;

pub use settings::StaybookConfig;

use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

/// Loads configuration from `explicit`, or from the platform config file.
///
/// A missing file yields the defaults. Environment overrides apply last.
pub fn load_config(explicit: Option<&Path>) -> Result<StaybookConfig> {
    let config = match explicit {
        Some(path) => read_config(path)?,
        None => read_config(&paths::config_file()?)?,
    };
    Ok(config.with_env_overrides())
}

fn read_config(path: &Path) -> Result<StaybookConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StaybookConfig::default()),
        Err(e) => Err(e.into()),
    }
}
