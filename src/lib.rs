// src/lib.rs
//! Sparklab Execution Engine Library
//!
//! This library runs untrusted source snippets as isolated child processes,
//! streams their output live, and guarantees deterministic resource teardown
//! on every exit path.
//!
//! # Architecture
//!
//! The engine is structured into three modules:
//!
//! - **session**: The session registry and lifecycle state machine
//! - **runtime**: Workspaces, the process launcher, and output multiplexing
//! - **notify**: Typed session events and predicate-based fan-out
//! - **utils**: Errors and configuration
//!
//! # Usage
//!
//! ```no_run
//! use sparklab_executor::{
//!     ExecutionRequest, ExecutorConfig, NotifierHub, Predicate, SessionRegistry,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = ExecutorConfig::default();
//! let hub = Arc::new(NotifierHub::new(config.subscriber_buffer));
//! let registry = Arc::new(SessionRegistry::new(config, Arc::clone(&hub)));
//!
//! let mut sub = hub.subscribe(Predicate::All);
//! let id = registry.submit(ExecutionRequest::new("python", "print('hi')"))?;
//!
//! while let Some(event) = sub.receiver.recv().await {
//!     println!("{}", serde_json::to_string(&event)?);
//!     if event.is_terminal() && event.session_id == id {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod notify;
pub mod runtime;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use notify::{
    CompletionReason, EventKind, NotifierHub, Predicate, SessionEvent, StreamKind, SubscriberId,
    Subscription,
};
pub use runtime::{Language, ProcessLauncher, WorkspaceManager};
pub use session::{ExecutionRequest, Session, SessionRegistry, SessionState};
pub use utils::{ExecutorConfig, ExecutorError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
