//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on disk.
//! Saves are validated first and written through a sibling temp file
//! plus rename, so a crash mid-write leaves the previous file intact.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::RigConfig;
use crate::error::ConfigError;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<RigConfig, ConfigError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", self.path.display())))?;
        let cfg = RigConfig::from_json(&text)?;
        info!(
            "JsonConfigFile: loaded {} ({} kettles, {} steps)",
            self.path.display(),
            cfg.kettles.len(),
            cfg.recipe.len()
        );
        Ok(cfg)
    }

    fn save(&self, config: &RigConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| ConfigError::Io(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", self.path.display())))?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}
