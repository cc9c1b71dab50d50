// src/session/mod.rs
//! Session lifecycle and registry
//!
//! - **Record**: Session snapshots and the state machine
//! - **Registry**: Submission, cancellation, status, and the per-session
//!   driver tasks
//!
//! The registry is the single writer of execution status; everything else
//! observes sessions through snapshots and events.

pub mod record;
pub mod registry;

pub use record::{Session, SessionState};
pub use registry::{ExecutionRequest, SessionRegistry};
