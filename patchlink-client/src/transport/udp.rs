//! UDP transports
//!
//! Both variants bind an ephemeral local socket and address one peer. The
//! polled variant is drained from the caller's idle loop once per UI frame;
//! the threaded variant owns a dedicated receive thread that blocks with a
//! short read timeout so shutdown can stop and join it promptly.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use patchlink_protocol::{codec, WireMessage};
use patchlink_utils::{PatchlinkError, Result};

use super::{apply_inbound, SessionFlags, Transport};

/// Largest payload a single UDP datagram can carry
const MAX_DATAGRAM: usize = 65_507;

/// How often the background receive thread re-checks its stop flag
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// UDP transport drained by periodic non-blocking receive
pub struct PolledUdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    flags: Arc<SessionFlags>,
}

impl PolledUdpTransport {
    pub fn connect(peer: SocketAddr, flags: Arc<SessionFlags>) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(PatchlinkError::Bind)?;
        socket.set_nonblocking(true).map_err(PatchlinkError::Bind)?;
        Ok(Self {
            socket,
            peer,
            flags,
        })
    }
}

impl Transport for PolledUdpTransport {
    fn send(&mut self, msg: &WireMessage) -> Result<()> {
        send_datagram(&self.socket, self.peer, msg);
        Ok(())
    }

    fn poll(&mut self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => handle_datagram(&self.flags, &buf[..len], src),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("receive error: {}", e);
                    break;
                }
            }
        }
    }
}

/// UDP transport with a dedicated background receive thread
pub struct ThreadedUdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    stop: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

impl ThreadedUdpTransport {
    pub fn connect(peer: SocketAddr, flags: Arc<SessionFlags>) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(PatchlinkError::Bind)?;
        let recv_socket = socket.try_clone().map_err(PatchlinkError::Bind)?;
        recv_socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(PatchlinkError::Bind)?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let receiver = std::thread::Builder::new()
            .name("patchlink-recv".into())
            .spawn(move || receive_loop(recv_socket, flags, thread_stop))
            .map_err(|e| PatchlinkError::connection(format!("spawn receiver: {}", e)))?;

        Ok(Self {
            socket,
            peer,
            stop,
            receiver: Some(receiver),
        })
    }
}

impl Transport for ThreadedUdpTransport {
    fn send(&mut self, msg: &WireMessage) -> Result<()> {
        send_datagram(&self.socket, self.peer, msg);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.receiver.take() {
            // No handler can run once this returns.
            if handle.join().is_err() {
                warn!("receive thread panicked during shutdown");
            }
        }
    }
}

impl Drop for ThreadedUdpTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(socket: UdpSocket, flags: Arc<SessionFlags>, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; MAX_DATAGRAM];
    while !stop.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((len, src)) => handle_datagram(&flags, &buf[..len], src),
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

/// Fire-and-forget transmit; failures are logged and dropped
fn send_datagram(socket: &UdpSocket, peer: SocketAddr, msg: &WireMessage) {
    let wire = codec::encode_datagram(msg);
    if let Err(e) = socket.send_to(&wire, peer) {
        debug!("dropped outbound {}: {}", msg.address(), e);
    }
}

fn handle_datagram(flags: &SessionFlags, data: &[u8], src: SocketAddr) {
    match codec::decode_datagram(data) {
        Some(msg) => apply_inbound(flags, msg),
        None => debug!("dropping malformed datagram ({} bytes) from {}", data.len(), src),
    }
}
