use std::io;

use edit_core::CodecError;

/// Errors inside one connection session. Never leave the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("render task is gone")]
    RenderGone,
}

/// Errors that end the accept loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to start server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send edit: {0}")]
    Send(#[source] SessionError),

    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),

    #[error("editor task failed: {0}")]
    Editor(#[from] tokio::task::JoinError),
}
