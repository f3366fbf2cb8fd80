// Library interface for colab
// Exposes the session server and the editing client for embedding and tests

pub mod client;
pub mod config;
pub mod error;
pub mod framing;
pub mod render;
pub mod server;
pub mod session;
pub mod view;

pub use error::{ClientError, ServerError, SessionError};
pub use server::{Server, ServerEvent, ServerHandle};
pub use session::{Session, SessionEnd, SessionId, SessionInfo, SessionReport};
pub use view::{LogView, SnapshotView};
