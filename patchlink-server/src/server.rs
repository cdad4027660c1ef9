//! UDP receive loop for the remote peer
//!
//! Two scheduling models, chosen at bind time and never mixed: a dedicated
//! background thread blocking on receive, or a polled form drained from the
//! host's idle loop once per UI frame. Replies always go out of the same
//! socket to the datagram's source address.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use patchlink_engine::RemoteHost;
use patchlink_protocol::Capabilities;
use patchlink_utils::{PatchlinkError, Result};

use crate::handlers::handle_datagram;

/// Largest payload a single UDP datagram can carry
const MAX_DATAGRAM: usize = 65_507;

/// How often the background receive thread re-checks its stop flag
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// Host engine shared with the receive loop
pub type SharedHost = Arc<Mutex<dyn RemoteHost + Send>>;

/// Scheduling model for the server; fixed at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// Drained by [`RemoteServer::step`] from the host's idle loop
    Polled,
    /// Dedicated background receive thread started by [`RemoteServer::start`]
    Background,
}

/// The remote peer's UDP server
pub struct RemoteServer {
    socket: UdpSocket,
    mode: ServerMode,
    capabilities: Capabilities,
    host: SharedHost,
    stop: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

impl RemoteServer {
    /// Bind the server socket. Pass port 0 to let the OS pick (tests).
    ///
    /// A bind failure yields an error and no server.
    pub fn bind(
        port: u16,
        mode: ServerMode,
        capabilities: Capabilities,
        host: SharedHost,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).map_err(PatchlinkError::Bind)?;
        if mode == ServerMode::Polled {
            socket.set_nonblocking(true).map_err(PatchlinkError::Bind)?;
        } else {
            socket
                .set_read_timeout(Some(RECV_TIMEOUT))
                .map_err(PatchlinkError::Bind)?;
        }
        info!(
            "remote server listening on {} ({:?})",
            socket.local_addr().map_err(PatchlinkError::Bind)?,
            mode
        );
        Ok(Self {
            socket,
            mode,
            capabilities,
            host,
            stop: Arc::new(AtomicBool::new(false)),
            receiver: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(PatchlinkError::Bind)
    }

    /// Start the background receive thread. Background mode only; idempotent.
    pub fn start(&mut self) -> Result<()> {
        if self.mode != ServerMode::Background {
            return Err(PatchlinkError::internal(
                "start() is only valid in background mode",
            ));
        }
        if self.receiver.is_some() {
            return Ok(());
        }

        let socket = self.socket.try_clone().map_err(PatchlinkError::Bind)?;
        let capabilities = self.capabilities;
        let host = Arc::clone(&self.host);
        let stop = Arc::clone(&self.stop);

        self.receiver = Some(
            std::thread::Builder::new()
                .name("patchlink-server".into())
                .spawn(move || receive_loop(socket, capabilities, host, stop))
                .map_err(|e| PatchlinkError::internal(format!("spawn receiver: {}", e)))?,
        );
        Ok(())
    }

    /// Drain all pending datagrams without sleeping. Polled mode only; call
    /// once per UI frame from the host's idle loop.
    pub fn step(&mut self) {
        if self.mode != ServerMode::Polled {
            debug!("step() ignored in background mode");
            return;
        }
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => {
                    handle_datagram(&self.socket, src, &buf[..len], self.capabilities, &self.host);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("receive error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the background thread, if any, joining it before returning.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RemoteServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(
    socket: UdpSocket,
    capabilities: Capabilities,
    host: SharedHost,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    while !stop.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((len, src)) => handle_datagram(&socket, src, &buf[..len], capabilities, &host),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Timeout tick; re-check the stop flag.
            }
            Err(e) => warn!("receive error: {}", e),
        }
    }
    debug!("receive thread stopped");
}
