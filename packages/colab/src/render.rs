//! Per-session rendering task.
//!
//! The render actor is the only owner of a session's [`BufferEngine`]. Network
//! readers never touch the buffer; they send commands through a
//! [`RenderHandle`] and the actor applies them one at a time, in queue order.

use edit_core::{ApplyOutcome, BufferEngine, Edit, View};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::SessionId;

/// Messages that can be sent to the render actor
pub(crate) enum RenderCommand {
    Apply {
        edit: Edit,
        respond_to: oneshot::Sender<ApplyOutcome>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Vec<String>>,
    },
}

/// Handle to communicate with a render actor
#[derive(Clone)]
pub struct RenderHandle {
    sender: mpsc::Sender<RenderCommand>,
}

impl RenderHandle {
    /// Queue an edit and wait until the engine has handled it (and refreshed
    /// the view, if the document changed).
    pub async fn apply(&self, edit: Edit) -> Result<ApplyOutcome, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RenderCommand::Apply {
                edit,
                respond_to: tx,
            })
            .await
            .map_err(|_| SessionError::RenderGone)?;
        rx.await.map_err(|_| SessionError::RenderGone)
    }

    /// Current lines of the document.
    pub async fn snapshot(&self) -> Result<Vec<String>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RenderCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| SessionError::RenderGone)?;
        rx.await.map_err(|_| SessionError::RenderGone)
    }
}

/// The actor that owns one document and its view
pub struct RenderActor<V: View> {
    session: SessionId,
    engine: BufferEngine<V>,
    receiver: mpsc::Receiver<RenderCommand>,
    cancel: CancellationToken,
}

impl<V: View + Send + 'static> RenderActor<V> {
    /// Spawn the actor on the runtime. It stops when every handle is dropped
    /// or `cancel` fires, and releases the view either way.
    pub fn spawn(
        session: SessionId,
        view: V,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (RenderHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let actor = Self {
            session,
            engine: BufferEngine::new(view),
            receiver,
            cancel,
        };
        let task = tokio::spawn(actor.run());
        (RenderHandle { sender }, task)
    }

    async fn run(mut self) {
        debug!(session = %self.session, "render task started");

        loop {
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.receiver.recv() => command,
            };
            let Some(command) = command else { break };

            match command {
                RenderCommand::Apply { edit, respond_to } => {
                    let outcome = self.engine.apply(&edit);
                    let _ = respond_to.send(outcome);
                }
                RenderCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.engine.document().lines().to_vec());
                }
            }
        }

        self.engine.close();
        info!(
            session = %self.session,
            lines = self.engine.document().line_count(),
            "render task stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SnapshotView;

    #[tokio::test]
    async fn applies_in_queue_order() {
        let (view, mut text) = SnapshotView::channel();
        let (render, task) = RenderActor::spawn(SessionId(1), view, 4, CancellationToken::new());

        for (col, ch) in "abc".chars().enumerate() {
            render.apply(Edit::insert(ch, 0, col)).await.unwrap();
        }
        render.apply(Edit::delete(0, 1)).await.unwrap();
        assert!(matches!(
            render.apply(Edit::insert('z', 3, 0)).await,
            Ok(ApplyOutcome::Dropped(_))
        ));

        assert_eq!(render.snapshot().await.unwrap(), ["bc"]);
        assert_eq!(*text.borrow_and_update(), "bc");

        drop(render);
        task.await.unwrap();
        assert!(text.has_changed().is_err(), "view closed with the actor");
    }

    #[tokio::test]
    async fn cancel_stops_actor() {
        let cancel = CancellationToken::new();
        let (view, _text) = SnapshotView::channel();
        let (render, task) = RenderActor::spawn(SessionId(2), view, 4, cancel.clone());

        cancel.cancel();
        task.await.unwrap();
        assert!(matches!(
            render.apply(Edit::insert('x', 0, 0)).await,
            Err(SessionError::RenderGone)
        ));
    }
}
