//! Engine configuration loaded from `ltv.toml`.

use crate::core::error::LtvError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ltv.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory receiving `ingest.events.jsonl` and `dq.rejections.jsonl`.
    pub log_dir: PathBuf,
    /// Write journal lines for every ingested batch.
    pub journal: bool,
    /// Number of customers shown when no `--top` is given.
    pub default_top: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            journal: true,
            default_top: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LtvError> {
        let config: EngineConfig = toml::from_str(content)?;
        if config.default_top == 0 {
            return Err(LtvError::ValidationError(
                "default_top must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, `ltv.toml` in `base_dir` is
/// used when present and defaults apply otherwise. A relative `log_dir` is
/// resolved against the directory holding the config file.
pub fn load_config(explicit: Option<&Path>, base_dir: &Path) -> Result<EngineConfig, LtvError> {
    let config_path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(LtvError::NotFound(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let candidate = base_dir.join(CONFIG_FILE_NAME);
            if !candidate.exists() {
                let mut config = EngineConfig::default();
                config.log_dir = base_dir.join(&config.log_dir);
                return Ok(config);
            }
            candidate
        }
    };

    let content = fs::read_to_string(&config_path)?;
    let mut config = EngineConfig::from_toml_str(&content)?;
    if config.log_dir.is_relative() {
        let anchor = config_path.parent().unwrap_or(base_dir);
        config.log_dir = anchor.join(&config.log_dir);
    }
    Ok(config)
}
