//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod piva;
pub mod scan;

use std::path::{Path, PathBuf};

use deminimis_core::DeminimisConfig;

/// Default location of the JSON configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deminimis")
        .join("config.json")
}

/// Load the configuration from `--config`, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DeminimisConfig> {
    if let Some(path) = config_path {
        return Ok(DeminimisConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(DeminimisConfig::from_file(&default_path)?)
    } else {
        Ok(DeminimisConfig::default())
    }
}
