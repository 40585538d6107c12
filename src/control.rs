//! UDP control channel.
//!
//! The wire protocol is deliberately bare: inbound datagrams carry
//! `"<metadataPath> <motionPath>"` (single ASCII space, UTF-8, no envelope,
//! no framing); outbound datagrams carry an accuracy string or free text.
//! Delivery is fire-and-forget in both directions — a dropped datagram is
//! simply never seen, and no acknowledgment or retry exists.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::ReplayError;

/// Poll interval for the listener's shutdown flag.
const RECV_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Largest accepted command datagram.
const MAX_DATAGRAM: usize = 4096;

/// A "load and play" command: the two paths of one recorded trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayCommand {
    pub metadata_path: String,
    pub motion_path: String,
}

/// Events the listener hands to the session: a well-formed command, or the
/// error a malformed payload produced (reported, never silently dropped).
pub type InboundEvent = Result<ReplayCommand, ReplayError>;

/// Parse an inbound datagram payload into a command.
///
/// The payload must be UTF-8 and contain exactly two tokens separated by a
/// single ASCII space; anything else is a protocol error.
pub fn parse_command(payload: &[u8]) -> Result<ReplayCommand, ReplayError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| ReplayError::protocol("payload is not valid UTF-8"))?;

    let tokens: Vec<&str> = text.split(' ').collect();
    if tokens.len() != 2 {
        return Err(ReplayError::protocol(format!(
            "expected 2 space-separated paths, got {} tokens",
            tokens.len()
        )));
    }

    Ok(ReplayCommand {
        metadata_path: tokens[0].to_string(),
        motion_path: tokens[1].to_string(),
    })
}

/// Bidirectional best-effort datagram transport.
pub struct ControlChannel {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl ControlChannel {
    /// Bind the local receive endpoint and fix the remote send endpoint.
    pub fn bind(bind: SocketAddr, remote: SocketAddr) -> Result<Self, ReplayError> {
        let socket = UdpSocket::bind(bind).map_err(ReplayError::Transport)?;
        log::info!("control channel bound on {bind}, reporting to {remote}");
        Ok(Self { socket, remote })
    }

    /// The local receive address (useful when bound to an OS-chosen port).
    pub fn local_addr(&self) -> Result<SocketAddr, ReplayError> {
        self.socket.local_addr().map_err(ReplayError::Transport)
    }

    /// Send a UTF-8 text payload to the remote endpoint.
    ///
    /// Failures are recoverable: the caller reports them and carries on.
    pub fn send(&self, message: &str) -> Result<(), ReplayError> {
        self.socket
            .send_to(message.as_bytes(), self.remote)
            .map_err(ReplayError::Transport)?;
        Ok(())
    }

    /// Spawn the background listener thread.
    ///
    /// The listener is the sole producer on the returned channel; the tick
    /// loop is the sole consumer. Receive failures other than the poll
    /// timeout are forwarded as transport errors.
    pub fn spawn_listener(&self) -> Result<(CommandListener, Receiver<InboundEvent>), ReplayError> {
        let socket = self.socket.try_clone().map_err(ReplayError::Transport)?;
        socket
            .set_read_timeout(Some(RECV_POLL_TIMEOUT))
            .map_err(ReplayError::Transport)?;

        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || listen_loop(socket, tx, flag));

        Ok((
            CommandListener {
                running,
                handle: Some(handle),
            },
            rx,
        ))
    }
}

fn listen_loop(socket: UdpSocket, tx: Sender<InboundEvent>, running: Arc<AtomicBool>) {
    let mut buf = [0u8; MAX_DATAGRAM];
    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                log::debug!("received {len}-byte command datagram from {from}");
                if tx.send(parse_command(&buf[..len])).is_err() {
                    // Consumer gone; nothing left to listen for.
                    break;
                }
            }
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => {
                log::warn!("listener receive failed: {err}");
                if tx.send(Err(ReplayError::Transport(err))).is_err() {
                    break;
                }
            }
        }
    }
}

/// Handle to the background listener thread.
///
/// Dropping the handle stops the listener; in-flight receives are
/// abandoned at the next poll timeout, not drained.
pub struct CommandListener {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CommandListener {
    /// Stop the listener and join its thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CommandListener {
    fn drop(&mut self) {
        self.stop();
    }
}
