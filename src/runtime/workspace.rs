// src/runtime/workspace.rs
//! Per-session workspace management
//!
//! Every session gets a uniquely named directory under the configured root,
//! containing only the snippet's entry file. The directory is owned by a
//! [`WorkspaceGuard`]: release is idempotent, runs on every exit path of the
//! session, and falls back to a synchronous removal in `Drop` if the driver
//! task never reached its release point. Removal failures are retried in a
//! detached task with exponential backoff.

use crate::utils::errors::{ExecutorError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const RELEASE_RETRIES: u32 = 5;
const RELEASE_BACKOFF_BASE_MS: u64 = 100;

/// Factory for per-session workspace directories
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at `root` (created lazily on first acquire)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory for `session_id` and write the entry file
    pub async fn acquire(
        &self,
        session_id: &str,
        entry_file: &str,
        source: &[u8],
    ) -> Result<WorkspaceGuard> {
        let path = self.root.join(session_id);

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ExecutorError::Workspace(format!("failed to create {:?}: {}", path, e)))?;

        tokio::fs::write(path.join(entry_file), source)
            .await
            .map_err(|e| {
                ExecutorError::Workspace(format!("failed to write entry file: {}", e))
            })?;

        debug!("Workspace acquired at {:?}", path);
        Ok(WorkspaceGuard {
            path,
            released: false,
        })
    }
}

/// Exclusive handle to one session's workspace directory
pub struct WorkspaceGuard {
    path: PathBuf,
    released: bool,
}

impl WorkspaceGuard {
    /// Directory owned by this guard
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively remove the workspace; a second call is a no-op
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Workspace released at {:?}", self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to remove workspace {:?}: {}, retrying", self.path, e);
                spawn_release_retry(self.path.clone());
            }
        }
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        // Fallback for paths that never reached release(), e.g. a panicking
        // driver task
        if !self.released {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Workspace {:?} left behind on drop: {}", self.path, e);
                }
            }
        }
    }
}

/// Retry removal with exponential backoff; never blocks the caller
fn spawn_release_retry(path: PathBuf) {
    tokio::spawn(async move {
        for attempt in 1..=RELEASE_RETRIES {
            let backoff = Duration::from_millis(RELEASE_BACKOFF_BASE_MS << attempt);
            tokio::time::sleep(backoff).await;

            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {
                    debug!("Workspace {:?} removed on retry {}", path, attempt);
                    return;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => return,
                Err(e) => warn!("Retry {} removing {:?} failed: {}", attempt, path, e),
            }
        }
        warn!("Giving up on workspace {:?} after {} retries", path, RELEASE_RETRIES);
    });
}
