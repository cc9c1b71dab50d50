// src/runtime/launcher.rs
//! Process launcher for snippet interpreters
//!
//! Supported languages (allow-list):
//! - JavaScript (node)
//! - Python (python3)
//!
//! The source is always written to a file inside the session workspace and
//! the interpreter is invoked on that path as a plain argument; user input
//! never reaches a shell. Each child is started in its own process group so
//! that termination reaches any subprocesses it spawned.

use crate::utils::errors::{ExecutorError, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Allow-listed snippet languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Javascript,
    Python,
}

impl Language {
    /// Parse a caller-supplied language identifier
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "javascript" => Some(Language::Javascript),
            "python" => Some(Language::Python),
            _ => None,
        }
    }

    /// Get the interpreter command for this language
    pub fn interpreter(&self) -> &'static str {
        match self {
            Language::Javascript => "node",
            Language::Python => "python3",
        }
    }

    /// Get the entry file name written into the workspace
    pub fn entry_file(&self) -> &'static str {
        match self {
            Language::Javascript => "main.js",
            Language::Python => "main.py",
        }
    }

    /// Canonical identifier (the wire name)
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
        }
    }
}

/// A spawned interpreter process with its output streams detached
pub struct LaunchedChild {
    /// Handle for waiting on exit
    pub child: Child,

    /// Process id (also the process group id)
    pub pid: u32,

    /// Standard output, taken by the stream readers
    pub stdout: Option<ChildStdout>,

    /// Standard error, taken by the stream readers
    pub stderr: Option<ChildStderr>,
}

/// Launcher resolving and spawning interpreter processes
pub struct ProcessLauncher {
    /// Paths to interpreter binaries (cached)
    interpreter_paths: RwLock<HashMap<Language, PathBuf>>,
}

impl ProcessLauncher {
    /// Create a new launcher
    pub fn new() -> Self {
        Self {
            interpreter_paths: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the interpreter cache directly, bypassing PATH resolution
    #[cfg(test)]
    pub(crate) fn override_interpreter(&self, language: Language, path: PathBuf) {
        self.interpreter_paths.write().insert(language, path);
    }

    /// Find the interpreter binary for a language
    fn resolve(&self, language: Language) -> Result<PathBuf> {
        if let Some(path) = self.interpreter_paths.read().get(&language) {
            return Ok(path.clone());
        }

        let command = language.interpreter();
        match which::which(command) {
            Ok(path) => {
                info!("Found {} at {:?}", command, path);
                self.interpreter_paths.write().insert(language, path.clone());
                Ok(path)
            }
            Err(e) => Err(ExecutorError::LaunchFailed(format!(
                "interpreter '{}' not found in PATH: {}",
                command, e
            ))),
        }
    }

    /// Spawn the interpreter on the entry file inside `scope`
    pub async fn spawn(&self, scope: &Path, language: Language) -> Result<LaunchedChild> {
        let interpreter = self.resolve(language)?;
        let entry = scope.join(language.entry_file());

        debug!("Spawning {} on {:?}", language.as_str(), entry);

        let mut child = Command::new(interpreter)
            .arg(entry)
            .current_dir(scope)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutorError::LaunchFailed(format!("failed to spawn process: {}", e)))?;

        let pid = child
            .id()
            .ok_or_else(|| ExecutorError::LaunchFailed("process exited before start".into()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        debug!("Process spawned with PID {}", pid);

        Ok(LaunchedChild {
            child,
            pid,
            stdout,
            stderr,
        })
    }

    /// Terminate a process group: SIGTERM, bounded wait, then SIGKILL
    pub async fn terminate_group(&self, pid: u32, grace: Duration) {
        let pgid = Pid::from_raw(pid as i32);

        debug!("Sending SIGTERM to process group {}", pgid);
        if let Err(e) = killpg(pgid, Signal::SIGTERM) {
            // ESRCH means the group is already gone
            debug!("SIGTERM to group {} failed: {}", pgid, e);
            return;
        }

        tokio::time::sleep(grace).await;

        if group_alive(pid) {
            warn!("Process group {} survived SIGTERM, sending SIGKILL", pgid);
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!("SIGKILL to group {} failed: {}", pgid, e);
            }
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether any process in the group is still running
pub fn group_alive(pid: u32) -> bool {
    killpg(Pid::from_raw(pid as i32), None).is_ok()
}
