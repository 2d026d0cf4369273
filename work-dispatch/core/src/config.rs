// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::CoordinatorError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4242;
pub const DEFAULT_CAPACITY: usize = 128;
pub const DEFAULT_INACTIVITY_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_WAIT_INTERVAL_MS: u64 = 2000;

/// Coordinator tuning knobs
///
/// Every field may be omitted from the JSON file and falls back to its
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    pub host: String,
    pub port: u16,
    /// Maximum concurrent worker connections, also the listen backlog
    pub capacity: usize,
    /// A connection silent for longer than this is torn down
    pub inactivity_timeout_ms: u64,
    /// Upper bound on one multiplexer wait
    pub wait_interval_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            capacity: DEFAULT_CAPACITY,
            inactivity_timeout_ms: DEFAULT_INACTIVITY_TIMEOUT_MS,
            wait_interval_ms: DEFAULT_WAIT_INTERVAL_MS,
        }
    }
}

impl CoordinatorConfig {
    pub fn load(path: &Path) -> Result<Self, CoordinatorError> {
        let contents = fs::read_to_string(path).map_err(|source| CoordinatorError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CoordinatorConfig =
            serde_json::from_str(&contents).map_err(|source| CoordinatorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.capacity == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.inactivity_timeout_ms == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "inactivity timeout must be positive".to_string(),
            ));
        }
        if self.wait_interval_ms == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "wait interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_millis(self.wait_interval_ms)
    }
}
