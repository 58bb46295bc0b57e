//! Persistent connection to the game server.
//!
//! The socket lives on its own thread with a single-threaded tokio runtime.
//! Decoded server events come back through a channel that the frame loop
//! drains with [`Connection::try_recv`]; outgoing messages go the other way.

use log::{error, info, warn};
use shared::{decode_frame, encode_frame, ClientMessage, ServerMessage};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(ServerMessage),
    Disconnected(String),
}

/// Decodes newline-delimited frames from `reader` until end of stream.
/// Frames that are not UTF-8 or fail to decode are logged and skipped.
pub async fn read_frames<R>(
    reader: R,
    events: &UnboundedSender<TransportEvent>,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut frames = reader.split(b'\n');
    while let Some(bytes) = frames.next_segment().await? {
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!("Dropping frame that is not UTF-8: {}", e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_frame::<ServerMessage>(line) {
            Ok(message) => {
                if events.send(TransportEvent::Message(message)).is_err() {
                    return Ok(());
                }
            }
            Err(e) => warn!("Dropping undecodable frame: {}", e),
        }
    }
    Ok(())
}

/// Writes every queued message as one frame until the queue is closed.
pub async fn write_frames<W>(
    mut outbound: UnboundedReceiver<ClientMessage>,
    mut writer: W,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let frame = encode_frame(&message)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn run_connection(
    address: &str,
    events: &UnboundedSender<TransportEvent>,
    outbound: UnboundedReceiver<ClientMessage>,
) -> Result<&'static str, TransportError> {
    let stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", address);
    let _ = events.send(TransportEvent::Connected);

    let (read_half, write_half) = stream.into_split();
    tokio::select! {
        result = read_frames(BufReader::new(read_half), events) => {
            result.map(|_| "server closed the connection")
        }
        result = write_frames(outbound, write_half) => {
            result.map(|_| "client closed the connection")
        }
    }
}

/// Handle to a live connection. Dropping it (or calling [`Connection::close`])
/// ends the session and closes the socket.
pub struct Connection {
    events: UnboundedReceiver<TransportEvent>,
    outbound: Option<UnboundedSender<ClientMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl Connection {
    /// Starts connecting to `address` in the background. Progress arrives as
    /// [`TransportEvent`]s; a failed connect shows up as `Disconnected`.
    pub fn open(address: &str) -> Result<Self, TransportError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let address = address.to_string();

        let worker = thread::Builder::new()
            .name("transport".to_string())
            .spawn(move || {
                let reason = match runtime.block_on(run_connection(&address, &event_tx, outbound_rx)) {
                    Ok(reason) => reason.to_string(),
                    Err(e) => {
                        error!("Connection to {} failed: {}", address, e);
                        e.to_string()
                    }
                };
                let _ = event_tx.send(TransportEvent::Disconnected(reason));
            })?;

        Ok(Self {
            events: event_rx,
            outbound: Some(outbound_tx),
            worker: Some(worker),
        })
    }

    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }

    /// Waits for the next event. Returns `None` once the connection thread
    /// has finished and every event has been read. Must not be called from
    /// inside an async context.
    pub fn recv_blocking(&mut self) -> Option<TransportEvent> {
        self.events.blocking_recv()
    }

    pub fn send(&self, message: ClientMessage) -> Result<(), TransportError> {
        match &self.outbound {
            Some(sender) => sender.send(message).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    /// Closes the outbound queue and waits for the connection thread.
    pub fn close(mut self) {
        self.outbound.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Transport thread panicked");
            }
        }
    }
}
