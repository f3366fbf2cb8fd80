//! Local Echo Producer: a terminal editor that mirrors every edit to the
//! server.
//!
//! Keys are captured on a blocking thread (the terminal event API is
//! synchronous). Each key that changes the document is applied locally and
//! the resulting [`Edit`] is written to the connection before the next key is
//! read, so the server sees edits in keystroke order.

pub mod editor;
pub mod keymap;
pub mod ui;

use std::time::Duration;

use edit_core::Edit;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{self, Event};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, SessionError};
use crate::framing;
use editor::{LocalEditor, Step};

/// Why the client stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientOutcome {
    /// The user asked to quit.
    Quit,
    /// The server closed the connection.
    ServerClosed,
}

/// Write half of the connection, one frame per edit.
pub struct EditSender<W> {
    writer: W,
    sent: u64,
}

impl<W: AsyncWrite + Unpin> EditSender<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    pub async fn send(&mut self, edit: &Edit) -> Result<(), SessionError> {
        framing::write_edit(&mut self.writer, edit).await?;
        self.sent += 1;
        Ok(())
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Close the write direction. The server sees end of stream.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.writer.shutdown().await
    }
}

/// Connect, run the editor until quit or disconnect, then close the
/// connection and restore the terminal.
pub async fn run_client(config: ClientConfig) -> Result<ClientOutcome, ClientError> {
    let stream = TcpStream::connect(&config.address)
        .await
        .map_err(|source| ClientError::Connect {
            addr: config.address.clone(),
            source,
        })?;
    info!("connected to {}", config.address);

    let (read_half, write_half) = stream.into_split();
    let server_closed = CancellationToken::new();
    let watcher = tokio::spawn(watch_server(read_half, server_closed.clone()));

    let runtime = Handle::current();
    let status = format!("connected to {}", config.address);
    let poll_interval = config.poll_interval;

    let result = tokio::task::spawn_blocking(move || {
        let mut terminal = ratatui::try_init().map_err(ClientError::Terminal)?;
        let mut sender = EditSender::new(write_half);

        let outcome = editor_loop(
            &mut terminal,
            &runtime,
            &mut sender,
            &server_closed,
            poll_interval,
            &status,
        );
        ratatui::restore();

        if let Err(e) = runtime.block_on(sender.shutdown()) {
            debug!("failed to shut down connection: {}", e);
        }
        info!(sent = sender.sent(), "editor stopped");
        outcome
    })
    .await?;

    watcher.abort();
    result
}

fn editor_loop<W: AsyncWrite + Unpin>(
    terminal: &mut DefaultTerminal,
    runtime: &Handle,
    sender: &mut EditSender<W>,
    server_closed: &CancellationToken,
    poll_interval: Duration,
    status: &str,
) -> Result<ClientOutcome, ClientError> {
    let mut editor = LocalEditor::new();

    loop {
        terminal
            .draw(|frame| ui::draw(frame, &editor, status))
            .map_err(ClientError::Terminal)?;

        if server_closed.is_cancelled() {
            return Ok(ClientOutcome::ServerClosed);
        }

        if !event::poll(poll_interval).map_err(ClientError::Terminal)? {
            continue;
        }

        let Event::Key(key) = event::read().map_err(ClientError::Terminal)? else {
            // Resize and friends: the next draw picks them up.
            continue;
        };

        match editor.handle(keymap::map_key(&key)) {
            Step::Send(edit) => {
                debug!(%edit, "sending edit");
                if let Err(e) = runtime.block_on(sender.send(&edit)) {
                    warn!("failed to send edit: {}", e);
                    return Err(ClientError::Send(e));
                }
            }
            Step::Local => {}
            Step::Quit => return Ok(ClientOutcome::Quit),
        }
    }
}

/// The server never writes; reading only detects the connection closing.
async fn watch_server<R: AsyncRead + Unpin>(mut reader: R, closed: CancellationToken) {
    match tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
        Ok(_) => info!("server closed the connection"),
        Err(e) => warn!("connection lost: {}", e),
    }
    closed.cancel();
}
