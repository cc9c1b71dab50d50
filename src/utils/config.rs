// src/utils/config.rs
//! Executor configuration
//!
//! Defaults cover local development; every field can be overridden through
//! `EXECUTOR_*` environment variables (e.g. `EXECUTOR_TIMEOUT_SECS=30`).

use crate::utils::errors::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the execution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Root directory under which per-session workspaces are created
    pub workspace_root: PathBuf,

    /// Maximum accepted source size in bytes
    pub max_source_bytes: usize,

    /// Wall-clock budget for a single execution, in seconds
    pub timeout_secs: u64,

    /// Grace window between SIGTERM and SIGKILL, in milliseconds
    pub cancel_grace_ms: u64,

    /// Capacity of the per-session event queue (drop-oldest on overflow)
    pub event_queue_capacity: usize,

    /// Buffer size of each subscriber channel
    pub subscriber_buffer: usize,

    /// How long a terminal session stays queryable before eviction, in seconds
    pub eviction_grace_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("sparklab-workspaces"),
            max_source_bytes: 64 * 1024, // 64 KiB
            timeout_secs: 10,
            cancel_grace_ms: 2_000,
            event_queue_capacity: 256,
            subscriber_buffer: 1_024,
            eviction_grace_secs: 30,
        }
    }
}

impl ExecutorConfig {
    /// Load configuration: defaults merged with `EXECUTOR_*` env overrides
    pub fn load() -> Result<Self> {
        let defaults = config::Config::try_from(&ExecutorConfig::default())
            .map_err(|e| ExecutorError::Config(e.to_string()))?;

        config::Config::builder()
            .add_source(defaults)
            .add_source(config::Environment::with_prefix("EXECUTOR").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ExecutorError::Config(e.to_string()))
    }

    /// Execution wall-clock budget
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// SIGTERM-to-SIGKILL grace window
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    /// Delay before a terminal session is evicted from the registry
    pub fn eviction_grace(&self) -> Duration {
        Duration::from_secs(self.eviction_grace_secs)
    }
}
