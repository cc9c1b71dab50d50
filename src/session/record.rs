// src/session/record.rs
//! Session records and the execution state machine
//!
//! A session moves through a total order of states:
//!
//! ```text
//! Queued → Running → { Succeeded | Failed | TimedOut | Cancelled }
//! ```
//!
//! No transition is ever revisited and nothing follows a terminal state.
//! Only the driver task owning a session writes its record; every other
//! caller takes read-only snapshots.

use crate::notify::event::{EventKind, SessionEvent};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl SessionState {
    /// Whether this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Queued | SessionState::Running)
    }
}

/// Snapshot of one accepted execution's lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique id assigned at acceptance
    pub id: String,

    /// Language identifier the request was submitted with
    pub language: String,

    /// Opaque caller reference (e.g. project id), not interpreted here
    pub project_ref: Option<String>,

    /// Current lifecycle state
    pub state: SessionState,

    /// Workspace directory; populated only while Queued or Running
    pub workspace_path: Option<PathBuf>,

    /// Child process id (also its process group id); populated only while
    /// Running
    pub pid: Option<u32>,

    /// Request acceptance time
    pub created_at: DateTime<Utc>,

    /// Set when the child process is confirmed started
    pub started_at: Option<DateTime<Utc>>,

    /// Set on the terminal transition
    pub ended_at: Option<DateTime<Utc>>,

    /// Set only on natural process termination
    pub exit_code: Option<i32>,
}

impl Session {
    /// Create a fresh `Queued` record
    pub fn new(id: String, language: String, project_ref: Option<String>) -> Self {
        Self {
            id,
            language,
            project_ref,
            state: SessionState::Queued,
            workspace_path: None,
            pid: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            exit_code: None,
        }
    }
}

/// Shared per-session handle: record, sequence counter, cancel token, and
/// the bounded event queue feeding the notifier pump
pub(crate) struct SessionHandle {
    record: RwLock<Session>,
    sequence: AtomicU64,
    cancel: CancellationToken,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Create a handle with an event queue of `queue_capacity`
    pub(crate) fn new(record: Session, queue_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(queue_capacity);
        Self {
            record: RwLock::new(record),
            sequence: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            events,
        }
    }

    /// Read-only copy of the current record
    pub(crate) fn snapshot(&self) -> Session {
        self.record.read().clone()
    }

    /// Session id
    pub(crate) fn id(&self) -> String {
        self.record.read().id.clone()
    }

    /// Mutate the record; single-writer discipline is the caller's contract
    pub(crate) fn update<F: FnOnce(&mut Session)>(&self, f: F) {
        f(&mut self.record.write());
    }

    /// Cancellation token observed by the driver task
    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the session unless it is already terminal. The state check and
    /// the token flip happen while holding the record lock, so the terminal
    /// transition in `finalize` (which takes the write lock) cannot slip in
    /// between them.
    pub(crate) fn request_cancel(&self) -> bool {
        let record = self.record.read();
        if record.state.is_terminal() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Allocate the next event sequence number
    pub(crate) fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribe to this session's event queue (pump side)
    pub(crate) fn event_receiver(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Emit an event into the session queue; never blocks the caller. The
    /// queue evicts its oldest entry when full, surfaced downstream as an
    /// overflow event.
    pub(crate) fn emit(&self, kind: EventKind) {
        let event = SessionEvent {
            session_id: self.record.read().id.clone(),
            sequence: self.next_sequence(),
            timestamp: Utc::now(),
            kind,
        };
        let _ = self.events.send(event);
    }
}
