// src/runtime/multiplexer.rs
//! Output multiplexing between child process and notifier
//!
//! Two independent reader tasks drain stdout and stderr, chunked by
//! availability, and stamp each chunk with the session's next sequence
//! number. Chunks enter a bounded per-session queue; when the queue is full
//! the oldest entry is evicted so the readers never block on a slow
//! consumer. A child writing into a full OS pipe would otherwise deadlock
//! the whole execution. The pump task on the other end of the queue
//! forwards events to the notifier hub and converts eviction gaps into
//! synthetic `overflow` events carrying the dropped count.

use crate::notify::event::{EventKind, SessionEvent, StreamKind};
use crate::notify::hub::NotifierHub;
use crate::session::record::SessionHandle;
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const READ_CHUNK_BYTES: usize = 4096;

/// Spawn the reader tasks for both child streams
pub(crate) fn spawn_stream_readers(
    handle: &Arc<SessionHandle>,
    stdout: Option<impl AsyncRead + Unpin + Send + 'static>,
    stderr: Option<impl AsyncRead + Unpin + Send + 'static>,
) -> Vec<JoinHandle<()>> {
    let mut readers = Vec::with_capacity(2);

    if let Some(stream) = stdout {
        let handle = Arc::clone(handle);
        readers.push(tokio::spawn(async move {
            read_stream(handle, stream, StreamKind::Stdout).await;
        }));
    }
    if let Some(stream) = stderr {
        let handle = Arc::clone(handle);
        readers.push(tokio::spawn(async move {
            read_stream(handle, stream, StreamKind::Stderr).await;
        }));
    }

    readers
}

/// Read one stream to EOF, emitting an output event per chunk
async fn read_stream(
    handle: Arc<SessionHandle>,
    mut stream: impl AsyncRead + Unpin,
    kind: StreamKind,
) {
    let mut buf = vec![0u8; READ_CHUNK_BYTES];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("{:?} reader reached EOF", kind);
                break;
            }
            Ok(n) => {
                handle.emit(EventKind::Output {
                    stream: kind,
                    content: String::from_utf8_lossy(&buf[..n]).into_owned(),
                });
            }
            Err(e) => {
                warn!("Error reading {:?}: {}", kind, e);
                break;
            }
        }
    }
}

/// Spawn the pump forwarding session events to the hub until the terminal
/// event passes through
pub(crate) fn spawn_event_pump(
    handle: Arc<SessionHandle>,
    mut queue: broadcast::Receiver<SessionEvent>,
    hub: Arc<NotifierHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match queue.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    hub.publish(&event);
                    if terminal {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(dropped_count)) => {
                    warn!(
                        "Session {} queue overflowed, {} events dropped",
                        handle.id(),
                        dropped_count
                    );
                    hub.publish(&SessionEvent {
                        session_id: handle.id(),
                        sequence: handle.next_sequence(),
                        timestamp: Utc::now(),
                        kind: EventKind::Overflow { dropped_count },
                    });
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
