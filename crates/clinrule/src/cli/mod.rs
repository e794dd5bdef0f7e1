//! CLI functionality for the clinrule tool
//!
//! This module contains:
//! - Rule evaluation from command-line inputs
//! - Rule table validation
//! - Patient and population analysis over JSON data files
//! - Output formatting

pub mod analyze;
pub mod evaluate;
pub mod output;
pub mod validate;

use anyhow::{Context, Result};
use clinrule_eval::EngineConfig;
use std::path::{Path, PathBuf};

/// Resolve the engine configuration from an optional file, the environment and an
/// optional rules folder override, in that order of precedence (last wins).
pub fn load_config(config_file: Option<&Path>, rules_folder: Option<PathBuf>) -> Result<EngineConfig> {
    let config = match config_file {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let config = config.with_env_overrides();

    Ok(match rules_folder {
        Some(folder) => config.with_rules_folder(folder),
        None => config,
    })
}
