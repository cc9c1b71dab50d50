// src/session/registry.rs
//! Session registry: the authoritative execution state machine
//!
//! The registry is the single writer of session status. `submit` validates
//! synchronously, then hands the session to a detached driver task and
//! returns; the driver owns the whole lifecycle from workspace acquisition
//! through terminal transition and workspace release. Timeout is enforced
//! here with the registry's own timer, so a hung or silent child is bounded
//! even if the launcher misbehaves. Cancellation escalates from SIGTERM to
//! a SIGKILL of the process group after the grace window.
//!
//! Driver bodies run in their own tasks: a panic inside one session's
//! handling surfaces as a `JoinError`, is folded into a `Failed` terminal
//! state, and never touches other sessions or the registry map.

use crate::notify::event::{CompletionReason, EventKind};
use crate::notify::hub::NotifierHub;
use crate::runtime::launcher::{Language, ProcessLauncher};
use crate::runtime::multiplexer::{spawn_event_pump, spawn_stream_readers};
use crate::runtime::workspace::{WorkspaceGuard, WorkspaceManager};
use crate::session::record::{Session, SessionHandle, SessionState};
use crate::utils::config::ExecutorConfig;
use crate::utils::errors::{ExecutorError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use ulid::Ulid;

/// Immutable execution request; gains no identity until accepted
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Wire language identifier, validated against the allow-list
    pub language: String,

    /// Snippet source
    pub source: Bytes,

    /// Opaque caller reference, carried through to status snapshots
    pub project_ref: Option<String>,

    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

impl ExecutionRequest {
    /// Build a request for `language` with the given source
    pub fn new(language: impl Into<String>, source: impl Into<Bytes>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            project_ref: None,
            submitted_at: Utc::now(),
        }
    }

    /// Attach an opaque project reference
    pub fn with_project_ref(mut self, project_ref: impl Into<String>) -> Self {
        self.project_ref = Some(project_ref.into());
        self
    }
}

/// How the child's run ended, from the driver's point of view
enum Outcome {
    Exited(Option<i32>),
    TimedOut,
    Cancelled,
}

/// Registry owning every in-flight session
pub struct SessionRegistry {
    config: ExecutorConfig,
    launcher: ProcessLauncher,
    workspaces: WorkspaceManager,
    hub: Arc<NotifierHub>,
    sessions: DashMap<String, Arc<SessionHandle>>,
}

impl SessionRegistry {
    /// Create a registry publishing events into `hub`
    pub fn new(config: ExecutorConfig, hub: Arc<NotifierHub>) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace_root.clone());
        Self {
            config,
            launcher: ProcessLauncher::new(),
            workspaces,
            hub,
            sessions: DashMap::new(),
        }
    }

    /// The hub this registry publishes to
    pub fn hub(&self) -> &Arc<NotifierHub> {
        &self.hub
    }

    /// Number of sessions currently held (in-flight plus terminal within the
    /// eviction grace window)
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Validate a request, create a `Queued` session, and begin execution
    /// asynchronously. Returns the session id immediately.
    pub fn submit(self: &Arc<Self>, request: ExecutionRequest) -> Result<String> {
        let language = Language::parse(&request.language)
            .ok_or_else(|| ExecutorError::UnsupportedLanguage(request.language.clone()))?;

        if request.source.len() > self.config.max_source_bytes {
            return Err(ExecutorError::CodeTooLarge {
                size: request.source.len(),
                limit: self.config.max_source_bytes,
            });
        }

        let id = Ulid::new().to_string();
        let record = Session::new(id.clone(), request.language.clone(), request.project_ref);
        let handle = Arc::new(SessionHandle::new(record, self.config.event_queue_capacity));
        self.sessions.insert(id.clone(), Arc::clone(&handle));

        info!("Session {} accepted ({})", id, language.as_str());

        // The pump subscribes before the driver can emit anything, so no
        // event is lost between acceptance and the first read.
        let pump_queue = handle.event_receiver();
        spawn_event_pump(Arc::clone(&handle), pump_queue, Arc::clone(&self.hub));

        let registry = Arc::clone(self);
        let driver_handle = Arc::clone(&handle);
        let session_id = id.clone();
        let source = request.source;
        tokio::spawn(async move {
            let driver = tokio::spawn({
                let registry = Arc::clone(&registry);
                let handle = Arc::clone(&driver_handle);
                async move { registry.drive(handle, language, source).await }
            });

            if let Err(e) = driver.await {
                error!("Session {} driver crashed: {}", session_id, e);
                registry
                    .finalize(
                        &driver_handle,
                        None,
                        SessionState::Failed,
                        None,
                        CompletionReason::LaunchError,
                    )
                    .await;
            }

            registry.schedule_eviction(session_id);
        });

        Ok(id)
    }

    /// Signal termination of a non-terminal session. Returns `false` for
    /// unknown, evicted, or already terminal sessions, emitting nothing. The
    /// terminal check and the token flip are atomic with respect to the
    /// driver's terminal transition; a session may still complete naturally
    /// after a `true` return if its process was already exiting.
    pub fn cancel(&self, session_id: &str) -> bool {
        let Some(handle) = self.sessions.get(session_id).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        if !handle.request_cancel() {
            return false;
        }

        info!("Cancelling session {}", session_id);
        true
    }

    /// Snapshot of a session's current record
    pub fn status(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .get(session_id)
            .map(|e| e.snapshot())
            .ok_or_else(|| ExecutorError::SessionNotFound(session_id.to_string()))
    }

    /// Full lifecycle of one session: workspace, launch, stream, wait,
    /// finalize. Every exit path releases the workspace.
    async fn drive(&self, handle: Arc<SessionHandle>, language: Language, source: Bytes) {
        let id = handle.id();

        let mut scope = match self
            .workspaces
            .acquire(&id, language.entry_file(), &source)
            .await
        {
            Ok(scope) => scope,
            Err(e) => {
                warn!("Session {}: {}", id, e);
                self.finalize(
                    &handle,
                    None,
                    SessionState::Failed,
                    None,
                    CompletionReason::LaunchError,
                )
                .await;
                return;
            }
        };
        handle.update(|s| s.workspace_path = Some(scope.path().to_owned()));

        // Cancelled before the process ever started
        if handle.cancel_token().is_cancelled() {
            self.finalize(
                &handle,
                Some(&mut scope),
                SessionState::Cancelled,
                None,
                CompletionReason::Cancelled,
            )
            .await;
            return;
        }

        let mut launched = match self.launcher.spawn(scope.path(), language).await {
            Ok(launched) => launched,
            Err(e) => {
                warn!("Session {}: {}", id, e);
                self.finalize(
                    &handle,
                    Some(&mut scope),
                    SessionState::Failed,
                    None,
                    CompletionReason::LaunchError,
                )
                .await;
                return;
            }
        };

        handle.update(|s| {
            s.state = SessionState::Running;
            s.started_at = Some(Utc::now());
            s.pid = Some(launched.pid);
        });
        handle.emit(EventKind::ExecutionStart);
        debug!("Session {} running as PID {}", id, launched.pid);

        let readers = spawn_stream_readers(&handle, launched.stdout.take(), launched.stderr.take());

        let outcome = tokio::select! {
            status = launched.child.wait() => match status {
                Ok(status) => Outcome::Exited(status.code()),
                Err(e) => {
                    warn!("Session {}: wait failed: {}", id, e);
                    Outcome::Exited(None)
                }
            },
            _ = tokio::time::sleep(self.config.timeout()) => Outcome::TimedOut,
            _ = handle.cancel_token().cancelled() => Outcome::Cancelled,
        };

        // Sweep the process group on every outcome, natural exit included:
        // an exited child can leave descendants behind, and their inherited
        // pipe ends would hold the readers open past the session's budget.
        // For a group with no survivors the SIGTERM is a no-op.
        self.launcher
            .terminate_group(launched.pid, self.config.cancel_grace())
            .await;
        if !matches!(outcome, Outcome::Exited(_)) {
            let _ = launched.child.wait().await;
        }

        // Drain the readers within a bound so all output precedes the
        // terminal event. A descendant that escaped into its own process
        // group could still hold the write ends open; abort rather than wait
        // on it.
        for reader in readers {
            let abort = reader.abort_handle();
            if tokio::time::timeout(self.config.cancel_grace(), reader)
                .await
                .is_err()
            {
                warn!("Session {}: output drain timed out, aborting reader", id);
                abort.abort();
            }
        }

        let (state, exit_code, reason) = match outcome {
            Outcome::Exited(Some(0)) => (SessionState::Succeeded, Some(0), CompletionReason::Exit),
            Outcome::Exited(code) => (SessionState::Failed, code, CompletionReason::Exit),
            Outcome::TimedOut => (SessionState::TimedOut, None, CompletionReason::Timeout),
            Outcome::Cancelled => (SessionState::Cancelled, None, CompletionReason::Cancelled),
        };
        self.finalize(&handle, Some(&mut scope), state, exit_code, reason)
            .await;
    }

    /// Apply the terminal transition, emit `execution_complete`, and release
    /// the workspace. No-op if the session is already terminal.
    async fn finalize(
        &self,
        handle: &SessionHandle,
        scope: Option<&mut WorkspaceGuard>,
        state: SessionState,
        exit_code: Option<i32>,
        reason: CompletionReason,
    ) {
        if handle.snapshot().state.is_terminal() {
            return;
        }

        handle.update(|s| {
            s.state = state;
            s.ended_at = Some(Utc::now());
            s.exit_code = exit_code;
            s.workspace_path = None;
            s.pid = None;
        });
        handle.emit(EventKind::ExecutionComplete { exit_code, reason });

        if let Some(scope) = scope {
            scope.release().await;
        }

        info!("Session {} finished: {:?}", handle.id(), state);
    }

    /// Keep terminal sessions queryable for the grace period, then evict
    fn schedule_eviction(self: &Arc<Self>, session_id: String) {
        let registry = Arc::clone(self);
        let grace = self.config.eviction_grace();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if registry.sessions.remove(&session_id).is_some() {
                debug!("Session {} evicted", session_id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::event::{SessionEvent, StreamKind};
    use crate::notify::hub::{Predicate, Subscription};
    use crate::runtime::launcher::group_alive;
    use std::time::Duration;

    fn test_registry(
        root: &std::path::Path,
        configure: impl FnOnce(&mut ExecutorConfig),
    ) -> (Arc<SessionRegistry>, Arc<NotifierHub>) {
        let mut config = ExecutorConfig {
            workspace_root: root.join("workspaces"),
            cancel_grace_ms: 300,
            eviction_grace_secs: 60,
            ..ExecutorConfig::default()
        };
        configure(&mut config);

        let hub = Arc::new(NotifierHub::new(config.subscriber_buffer));
        let registry = Arc::new(SessionRegistry::new(config, Arc::clone(&hub)));
        (registry, hub)
    }

    async fn collect_until_terminal(sub: &mut Subscription, session_id: &str) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(20), sub.receiver.recv())
                .await
                .expect("timed out waiting for events")
                .expect("hub closed the subscription");
            if event.session_id != session_id {
                continue;
            }
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }

    fn stdout_content(events: &[SessionEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Output {
                    stream: StreamKind::Stdout,
                    content,
                } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    fn assert_sequences_strictly_increase(events: &[SessionEvent]) {
        for pair in events.windows(2) {
            assert!(
                pair[0].sequence < pair[1].sequence,
                "sequence regressed: {} then {}",
                pair[0].sequence,
                pair[1].sequence
            );
        }
    }

    #[tokio::test]
    async fn test_ruby_rejected_and_no_session_created() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _hub) = test_registry(root.path(), |_| {});

        let err = registry
            .submit(ExecutionRequest::new("ruby", "puts 'hi'"))
            .unwrap_err();

        assert!(matches!(err, ExecutorError::UnsupportedLanguage(ref l) if l == "ruby"));
        assert_eq!(registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_source_rejected() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _hub) = test_registry(root.path(), |c| c.max_source_bytes = 8);

        let err = registry
            .submit(ExecutionRequest::new("python", "print('far too long')"))
            .unwrap_err();

        assert!(matches!(err, ExecutorError::CodeTooLarge { limit: 8, .. }));
        assert_eq!(registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_session_status_not_found() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _hub) = test_registry(root.path(), |_| {});

        let err = registry.status("01ARZ3NDEKTSV4RRFFQ69G5FAV").unwrap_err();
        assert!(matches!(err, ExecutorError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_python_hello_world() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "print('hi')"))
            .unwrap();
        let events = collect_until_terminal(&mut sub, &id).await;

        assert_eq!(events[0].kind, EventKind::ExecutionStart);
        assert_eq!(stdout_content(&events), "hi\n");
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: Some(0),
                reason: CompletionReason::Exit,
            }
        );
        assert_sequences_strictly_increase(&events);

        let session = registry.status(&id).unwrap();
        assert_eq!(session.state, SessionState::Succeeded);
        assert_eq!(session.exit_code, Some(0));
        assert!(session.started_at.is_some());
        assert!(session.ended_at.is_some());
        assert!(session.workspace_path.is_none());

        // Workspace directory is gone
        assert!(!root.path().join("workspaces").join(&id).exists());
    }

    #[tokio::test]
    async fn test_javascript_hello_world() {
        if which::which("node").is_err() {
            eprintln!("node not installed, skipping");
            return;
        }

        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("javascript", "console.log('hi')"))
            .unwrap();
        let events = collect_until_terminal(&mut sub, &id).await;

        assert_eq!(stdout_content(&events), "hi\n");
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: Some(0),
                reason: CompletionReason::Exit,
            }
        );
    }

    #[tokio::test]
    async fn test_stderr_delivered_as_output() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new(
                "python",
                "import sys\nsys.stderr.write('oops\\n')",
            ))
            .unwrap();
        let events = collect_until_terminal(&mut sub, &id).await;

        let stderr: String = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Output {
                    stream: StreamKind::Stderr,
                    content,
                } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(stderr, "oops\n");
        assert_eq!(registry.status(&id).unwrap().state, SessionState::Succeeded);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "raise SystemExit(3)"))
            .unwrap();
        let events = collect_until_terminal(&mut sub, &id).await;

        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: Some(3),
                reason: CompletionReason::Exit,
            }
        );
        let session = registry.status(&id).unwrap();
        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.exit_code, Some(3));
        assert!(!root.path().join("workspaces").join(&id).exists());
    }

    #[tokio::test]
    async fn test_infinite_loop_times_out() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |c| c.timeout_secs = 2);
        let mut sub = hub.subscribe(Predicate::All);

        let started = std::time::Instant::now();
        let id = registry
            .submit(ExecutionRequest::new("python", "while True: pass"))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let running = loop {
            let session = registry.status(&id).unwrap();
            if session.state == SessionState::Running {
                break session;
            }
            assert!(
                !session.state.is_terminal() && std::time::Instant::now() < deadline,
                "session never reached Running: {:?}",
                session.state
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        };
        let pid = running.pid.unwrap();

        let events = collect_until_terminal(&mut sub, &id).await;
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: None,
                reason: CompletionReason::Timeout,
            }
        );
        // Bounded delay past the configured limit
        assert!(started.elapsed() < Duration::from_secs(8));

        let session = registry.status(&id).unwrap();
        assert_eq!(session.state, SessionState::TimedOut);
        assert!(!group_alive(pid));
        assert!(!root.path().join("workspaces").join(&id).exists());
    }

    #[tokio::test]
    async fn test_orphaned_descendant_does_not_block_completion() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |c| c.timeout_secs = 5);
        let mut sub = hub.subscribe(Predicate::All);

        // Parent spawns a long sleeper into its own process group, prints,
        // lingers long enough for the pid capture, then exits naturally.
        let started = std::time::Instant::now();
        let id = registry
            .submit(ExecutionRequest::new(
                "python",
                "import subprocess, time\n\
                 subprocess.Popen(['sleep', '30'])\n\
                 print('parent done', flush=True)\n\
                 time.sleep(1)",
            ))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let running = loop {
            let session = registry.status(&id).unwrap();
            if session.state == SessionState::Running {
                break session;
            }
            assert!(
                !session.state.is_terminal() && std::time::Instant::now() < deadline,
                "session never reached Running: {:?}",
                session.state
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        };
        let pid = running.pid.unwrap();

        let events = collect_until_terminal(&mut sub, &id).await;
        assert_eq!(stdout_content(&events), "parent done\n");
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: Some(0),
                reason: CompletionReason::Exit,
            }
        );
        // Terminal transition well before the sleeper's 30s would elapse
        assert!(started.elapsed() < Duration::from_secs(10));

        let session = registry.status(&id).unwrap();
        assert_eq!(session.state, SessionState::Succeeded);
        assert!(!group_alive(pid));
        assert!(!root.path().join("workspaces").join(&id).exists());
    }

    #[tokio::test]
    async fn test_launch_failure_fails_session_and_releases_workspace() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        registry.launcher.override_interpreter(
            Language::Python,
            std::path::PathBuf::from("/nonexistent/bin/python3"),
        );
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "print(1)"))
            .unwrap();
        let events = collect_until_terminal(&mut sub, &id).await;

        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: None,
                reason: CompletionReason::LaunchError,
            }
        );
        assert!(events.iter().all(|e| e.kind != EventKind::ExecutionStart));

        let session = registry.status(&id).unwrap();
        assert_eq!(session.state, SessionState::Failed);
        assert!(session.exit_code.is_none());
        assert!(session.workspace_path.is_none());
        assert!(!root.path().join("workspaces").join(&id).exists());
    }

    #[tokio::test]
    async fn test_cancel_running_session() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |c| c.timeout_secs = 30);
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new(
                "python",
                "import time\ntime.sleep(30)",
            ))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let state = registry.status(&id).unwrap().state;
            if state == SessionState::Running {
                break;
            }
            assert!(
                !state.is_terminal() && std::time::Instant::now() < deadline,
                "session never reached Running: {:?}",
                state
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(registry.cancel(&id));

        let events = collect_until_terminal(&mut sub, &id).await;
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::ExecutionComplete {
                exit_code: None,
                reason: CompletionReason::Cancelled,
            }
        );
        assert_eq!(registry.status(&id).unwrap().state, SessionState::Cancelled);
        assert!(!root.path().join("workspaces").join(&id).exists());

        // Second cancel is a no-op on a terminal session
        assert!(!registry.cancel(&id));
    }

    #[tokio::test]
    async fn test_cancel_after_success_returns_false_and_emits_nothing() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "print('done')"))
            .unwrap();
        collect_until_terminal(&mut sub, &id).await;

        assert!(!registry.cancel(&id));
        assert!(!registry.cancel("no-such-session"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_have_distinct_workspaces() {
        let root = tempfile::tempdir().unwrap();
        let (registry, _hub) = test_registry(root.path(), |c| c.timeout_secs = 30);

        let mut ids = Vec::new();
        for _ in 0..4 {
            let id = registry
                .submit(ExecutionRequest::new(
                    "python",
                    "import time\ntime.sleep(10)",
                ))
                .unwrap();
            ids.push(id);
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let mut paths = Vec::new();
        for id in &ids {
            let path = loop {
                if let Some(path) = registry.status(id).unwrap().workspace_path {
                    break path;
                }
                assert!(
                    std::time::Instant::now() < deadline,
                    "workspace never assigned for {}",
                    id
                );
                tokio::time::sleep(Duration::from_millis(20)).await;
            };
            paths.push(path);
        }

        for i in 0..paths.len() {
            for j in i + 1..paths.len() {
                assert_ne!(paths[i], paths[j]);
            }
        }

        for id in &ids {
            registry.cancel(id);
        }
    }

    #[tokio::test]
    async fn test_terminal_session_evicted_after_grace() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |c| c.eviction_grace_secs = 0);
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "print('bye')"))
            .unwrap();
        collect_until_terminal(&mut sub, &id).await;

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            match registry.status(&id) {
                Err(ExecutorError::SessionNotFound(_)) => break,
                Ok(_) if std::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                other => panic!("session not evicted: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_project_ref_carried_into_status() {
        let root = tempfile::tempdir().unwrap();
        let (registry, hub) = test_registry(root.path(), |_| {});
        let mut sub = hub.subscribe(Predicate::All);

        let id = registry
            .submit(ExecutionRequest::new("python", "print(1)").with_project_ref("project-42"))
            .unwrap();
        collect_until_terminal(&mut sub, &id).await;

        let session = registry.status(&id).unwrap();
        assert_eq!(session.project_ref.as_deref(), Some("project-42"));
        assert_eq!(session.language, "python");
    }
}
