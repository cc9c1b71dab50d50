// src/runtime/mod.rs
//! Snippet execution runtime
//!
//! This module provides the process-facing half of the engine:
//!
//! - **Launcher**: Allow-listed interpreter resolution and process-group
//!   spawning (JavaScript, Python)
//! - **Workspace**: Isolated per-session directories with guaranteed release
//! - **Multiplexer**: Concurrent stream readers and the bounded,
//!   drop-oldest event queue between child and observers
//!
//! # Architecture
//!
//! ```text
//! Session driver
//!     │ acquire          spawn             read            forward
//!     ▼                  ▼                 ▼               ▼
//! WorkspaceGuard ──▶ ProcessLauncher ──▶ stream readers ──▶ event pump ──▶ NotifierHub
//!                        (node,            (stdout,          (overflow
//!                         python3)          stderr)           on lag)
//! ```
//!
//! The readers block only on child I/O, never on downstream consumers: a
//! full queue evicts its oldest event instead of stalling the child, which
//! keeps the OS pipe buffers draining.

pub mod launcher;
pub mod multiplexer;
pub mod workspace;

pub use launcher::{group_alive, Language, LaunchedChild, ProcessLauncher};
pub use workspace::{WorkspaceGuard, WorkspaceManager};
