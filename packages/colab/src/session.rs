//! Connection Session: one byte stream feeding one private document.
//!
//! The read loop splits the stream into frames, decodes each into an
//! [`Edit`], and hands it to the session's render task. Each edit is applied
//! before the next frame is read, so a session's document always reflects its
//! stream in arrival order.

use std::net::SocketAddr;

use edit_core::{ApplyOutcome, Edit, View};
use tokio::io::{AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::framing::{Frame, FrameReader};
use crate::render::RenderActor;

/// Unique identifier for a session
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer: SocketAddr,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub max_frame_bytes: usize,
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 1024 * 1024,
            queue_capacity: 256,
        }
    }
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed the stream.
    Disconnected,
    /// Shutdown was requested locally.
    Cancelled,
    /// Reading the stream failed.
    Failed { kind: std::io::ErrorKind, message: String },
    /// The render task stopped before the stream ended.
    RenderStopped,
}

/// Summary emitted when a session is torn down.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub info: SessionInfo,
    pub end: SessionEnd,
    /// Frames that changed the document.
    pub frames_applied: u64,
    /// Well-formed edits the document had no place for (stale row, nothing to
    /// delete).
    pub frames_dropped: u64,
    /// Frames that failed to decode or exceeded the size limit.
    pub frames_rejected: u64,
}

pub struct Session<R> {
    info: SessionInfo,
    reader: R,
    config: SessionConfig,
}

impl<R: AsyncRead + Unpin> Session<R> {
    pub fn new(info: SessionInfo, reader: R, config: SessionConfig) -> Self {
        Self {
            info,
            reader,
            config,
        }
    }

    /// Run until the stream ends, fails, or `cancel` fires.
    ///
    /// The stream and the view are released before this returns, on every
    /// path.
    pub async fn run<V>(self, view: V, cancel: CancellationToken) -> SessionReport
    where
        V: View + Send + 'static,
    {
        let Self {
            info,
            reader,
            config,
        } = self;
        info!(session = %info.id, peer = %info.peer, "new connection from {}", info.peer);

        let (render, render_task) =
            RenderActor::spawn(info.id, view, config.queue_capacity, cancel.child_token());

        let mut frames = FrameReader::new(BufReader::new(reader), config.max_frame_bytes);
        let mut frames_applied = 0u64;
        let mut frames_dropped = 0u64;
        let mut frames_rejected = 0u64;

        let end = loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break SessionEnd::Cancelled,
                frame = frames.next_frame() => frame,
            };

            let bytes = match frame {
                Ok(Some(Frame::Data(bytes))) => bytes,
                Ok(Some(Frame::Oversized { len })) => {
                    frames_rejected += 1;
                    warn!(
                        session = %info.id,
                        len,
                        limit = config.max_frame_bytes,
                        "oversized frame discarded"
                    );
                    continue;
                }
                Ok(None) => {
                    info!(session = %info.id, "client {} disconnected", info.peer);
                    break SessionEnd::Disconnected;
                }
                Err(e) => {
                    warn!(session = %info.id, peer = %info.peer, "failed to read data: {}", e);
                    break SessionEnd::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    };
                }
            };

            let edit = match Edit::decode(&bytes) {
                Ok(edit) => edit,
                Err(e) => {
                    frames_rejected += 1;
                    warn!(
                        session = %info.id,
                        kind = e.kind(),
                        "failed to decode edit, frame discarded: {}",
                        e
                    );
                    continue;
                }
            };

            debug!(session = %info.id, %edit, "edit received");
            match render.apply(edit).await {
                Ok(ApplyOutcome::Applied) => frames_applied += 1,
                Ok(ApplyOutcome::Dropped(_)) => frames_dropped += 1,
                Err(_) => {
                    break if cancel.is_cancelled() {
                        SessionEnd::Cancelled
                    } else {
                        SessionEnd::RenderStopped
                    };
                }
            }
        };

        // Stream first, then the render task, which releases the view.
        drop(frames);
        drop(render);
        if render_task.await.is_err() {
            warn!(session = %info.id, "render task panicked");
        }

        info!(
            session = %info.id,
            applied = frames_applied,
            dropped = frames_dropped,
            rejected = frames_rejected,
            end = ?end,
            "session closed"
        );

        SessionReport {
            info,
            end,
            frames_applied,
            frames_dropped,
            frames_rejected,
        }
    }
}
