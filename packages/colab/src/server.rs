//! Session Manager: accepts connections and runs one session per connection.
//!
//! Every session gets a private document and view. Nothing is shared or
//! broadcast between sessions, so edits from one client never reach another.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use edit_core::View;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::{Session, SessionConfig, SessionId, SessionInfo, SessionReport};
use crate::view::LogView;

/// Pause after an accept error that isn't tied to one connection (e.g. file
/// descriptor exhaustion), so the loop doesn't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Builds the view for each new session.
pub trait ViewFactory: Send + Sync + 'static {
    fn make_view(&self, info: &SessionInfo) -> Box<dyn View + Send>;
}

impl<F> ViewFactory for F
where
    F: Fn(&SessionInfo) -> Box<dyn View + Send> + Send + Sync + 'static,
{
    fn make_view(&self, info: &SessionInfo) -> Box<dyn View + Send> {
        self(info)
    }
}

/// Events emitted by the server
#[derive(Clone, Debug)]
pub enum ServerEvent {
    SessionStarted(SessionInfo),
    SessionEnded(SessionReport),
}

/// Cloneable control surface for a running server.
#[derive(Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    active: Arc<AtomicUsize>,
    events: broadcast::Sender<ServerEvent>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and cancel every live session.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

pub struct Server {
    listener: TcpListener,
    session_config: SessionConfig,
    views: Arc<dyn ViewFactory>,
    next_id: AtomicU64,
    handle: ServerHandle,
}

impl Server {
    /// Bind the listening endpoint. Sessions log their documents through a
    /// [`LogView`] unless [`Server::with_views`] says otherwise.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind(&config.bind_addr)
                .await
                .map_err(|source| ServerError::Bind {
                    addr: config.bind_addr.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;

        let (events, _) = broadcast::channel(256);
        Ok(Self {
            listener,
            session_config: config.session.clone(),
            views: Arc::new(|info: &SessionInfo| -> Box<dyn View + Send> {
                Box::new(LogView::new(info.id))
            }),
            next_id: AtomicU64::new(1),
            handle: ServerHandle {
                local_addr,
                shutdown: CancellationToken::new(),
                active: Arc::new(AtomicUsize::new(0)),
                events,
            },
        })
    }

    pub fn with_views(mut self, views: impl ViewFactory) -> Self {
        self.views = Arc::new(views);
        self
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr
    }

    /// Accept connections until shutdown or a listener failure.
    ///
    /// Errors tied to a single connection are logged and the loop keeps
    /// going. On return every session has finished and the listener is
    /// closed.
    pub async fn serve(self) -> Result<(), ServerError> {
        info!("Server is listening at (tcp:{})...", self.handle.local_addr);

        let shutdown = self.handle.shutdown.clone();
        let mut sessions = JoinSet::new();

        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested, closing listener");
                    break Ok(());
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        error!("session task failed: {}", e);
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_session(&mut sessions, stream, peer),
                    Err(e) => match classify_accept_error(&e) {
                        AcceptError::Connection => {
                            warn!("Error accepting connection: {}", e);
                        }
                        AcceptError::Transient => {
                            warn!("Error accepting connection: {}, backing off", e);
                            if !back_off(&shutdown).await {
                                info!("shutdown requested, closing listener");
                                break Ok(());
                            }
                        }
                        AcceptError::Listener => {
                            error!("listener failed: {}", e);
                            break Err(ServerError::Listener(e));
                        }
                    },
                },
            }
        };

        drop(self.listener);
        shutdown.cancel();
        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                error!("session task failed: {}", e);
            }
        }
        info!("Server closed successfully");
        result
    }

    fn spawn_session(&self, sessions: &mut JoinSet<()>, stream: TcpStream, peer: SocketAddr) {
        let info = SessionInfo {
            id: SessionId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            peer,
        };
        let view = self.views.make_view(&info);
        let session = Session::new(info.clone(), stream, self.session_config.clone());
        let cancel = self.handle.shutdown.child_token();
        let active = self.handle.active.clone();
        let events = self.handle.events.clone();

        active.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = events.send(ServerEvent::SessionStarted(info));

        sessions.spawn(async move {
            let report = session.run(view, cancel).await;
            active.fetch_sub(1, Ordering::SeqCst);
            let _ = events.send(ServerEvent::SessionEnded(report));
        });
    }
}

#[derive(Debug, PartialEq, Eq)]
enum AcceptError {
    /// The failed connection is gone; the next accept is unaffected.
    Connection,
    /// Process-level pressure; retry after a pause.
    Transient,
    /// The listening socket itself is unusable.
    Listener,
}

/// Wait out [`ACCEPT_BACKOFF`]. Returns `false` if shutdown came first.
async fn back_off(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => true,
    }
}

fn classify_accept_error(e: &io::Error) -> AcceptError {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut => AcceptError::Connection,
        io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected | io::ErrorKind::Unsupported => {
            AcceptError::Listener
        }
        _ => AcceptError::Transient,
    }
}
