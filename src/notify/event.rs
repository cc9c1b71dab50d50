// src/notify/event.rs
//! Session event types
//!
//! Every observable fact about an execution is a [`SessionEvent`]: lifecycle
//! transitions, output chunks, and overflow notices. Events serialize to the
//! wire format consumed by the IDE console (`snake_case` type tags), so a
//! transport layer can forward them verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which child stream an output chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Why an execution reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Natural process exit (code carried alongside)
    Exit,
    /// Wall-clock budget exceeded, process group killed
    Timeout,
    /// Explicit cancel, process group killed
    Cancelled,
    /// Interpreter could not be spawned
    LaunchError,
}

/// Event payload variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Child process confirmed started
    ExecutionStart,

    /// One chunk of child output, chunked by availability rather than lines
    Output { stream: StreamKind, content: String },

    /// Terminal transition; `exit_code` is `None` unless the process exited
    /// on its own
    ExecutionComplete {
        exit_code: Option<i32>,
        reason: CompletionReason,
    },

    /// Events were dropped because the session queue overflowed
    Overflow { dropped_count: u64 },
}

/// A timestamped, sequenced notification about one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Session this event belongs to
    pub session_id: String,

    /// Per-session monotonic sequence number
    pub sequence: u64,

    /// Emission time
    pub timestamp: DateTime<Utc>,

    /// Payload
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SessionEvent {
    /// True once this event's session can produce no further events
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::ExecutionComplete { .. })
    }
}
