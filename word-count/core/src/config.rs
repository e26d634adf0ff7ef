// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Job settings read from a JSON file; missing fields take their defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub workers_count: usize,
    pub logs_dir: PathBuf,
    pub print_results: bool,
    /// Frames buffered per channel by in-process transports
    pub channel_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            workers_count: 4,
            logs_dir: PathBuf::from("logs"),
            print_results: true,
            channel_capacity: 64,
        }
    }
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::ConfigMalformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, falling back to the defaults when it is missing or malformed
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be at least 1"));
        }
        Ok(())
    }
}
