//! Remote session lifecycle
//!
//! One logical connection to one peer. Connecting parses the peer address,
//! allocates the transport variant chosen by the caller and immediately
//! sends the handshake. "Connected" means the handshake was acknowledged
//! once; peer loss is never actively detected.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use patchlink_engine::{HostState, PatchEngine};
use patchlink_protocol::{PatchSnapshot, WireMessage};
use patchlink_utils::{remote_port, PatchlinkError, Result};

use crate::transport::{
    DirectTransport, PolledUdpTransport, SessionFlags, SnapshotFormat, ThreadedUdpTransport,
    Transport,
};

/// Scheduling model for a networked session; fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Non-blocking receive drained by [`RemoteSession::poll`] once per UI frame
    Polled,
    /// Dedicated background receive thread
    Background,
}

/// One peer's connection state
pub struct RemoteSession {
    address: String,
    first_contact: bool,
    auto_deploy: bool,
    flags: Arc<SessionFlags>,
    transport: Box<dyn Transport>,
}

impl RemoteSession {
    /// Connect to a networked peer at `udp://host[:port]`.
    ///
    /// Allocates the socket, starts the receive side for the chosen mode and
    /// sends `/hello`. A socket failure yields an error and no session.
    pub fn connect(address: &str, mode: TransportMode) -> Result<Self> {
        let peer = resolve_peer(address)?;
        let flags = Arc::new(SessionFlags::default());

        let transport: Box<dyn Transport> = match mode {
            TransportMode::Polled => {
                Box::new(PolledUdpTransport::connect(peer, Arc::clone(&flags))?)
            }
            TransportMode::Background => {
                Box::new(ThreadedUdpTransport::connect(peer, Arc::clone(&flags))?)
            }
        };

        let mut session = Self {
            address: address.to_string(),
            first_contact: true,
            auto_deploy: false,
            flags,
            transport,
        };
        session.send(&WireMessage::Hello)?;
        info!("remote session opened to {} ({:?})", address, mode);
        Ok(session)
    }

    /// Open a direct-access session over the host's set-state surface.
    ///
    /// There is nothing to hand-shake with, so the session starts connected
    /// and with auto-deploy enabled.
    pub fn direct(host: Box<dyn HostState + Send>) -> Self {
        let flags = Arc::new(SessionFlags::default());
        flags.connected.store(true, Ordering::SeqCst);

        info!("direct-access session opened");
        Self {
            address: "direct".to_string(),
            first_contact: true,
            auto_deploy: true,
            flags,
            transport: Box::new(DirectTransport::new(host)),
        }
    }

    /// The address this session was opened with
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the peer has acknowledged the handshake
    pub fn connected(&self) -> bool {
        self.flags.connected()
    }

    /// Whether the peer advertised screenshot forwarding at hello time
    pub fn peer_supports_screenshot(&self) -> bool {
        self.flags.peer_supports_screenshot()
    }

    /// True until the first full deployment over this session
    pub fn is_first_contact(&self) -> bool {
        self.first_contact
    }

    pub fn auto_deploy(&self) -> bool {
        self.auto_deploy
    }

    pub fn set_auto_deploy(&mut self, enabled: bool) {
        self.auto_deploy = enabled;
    }

    /// Drain pending inbound datagrams. Polled mode only; call once per UI
    /// frame. Never sleeps; no-op for the other transports.
    pub fn poll(&mut self) {
        self.transport.poll();
    }

    /// Send one message, fire-and-forget
    pub fn send(&mut self, msg: &WireMessage) -> Result<()> {
        self.transport.send(msg)
    }

    /// Push one module parameter value to the peer
    pub fn send_param_change(&mut self, module_id: i64, param_id: i32, value: f32) -> Result<()> {
        self.send(&WireMessage::Param {
            module_id,
            param_id,
            value,
        })
    }

    /// Push one host-exposed parameter value to the peer
    pub fn send_host_param(&mut self, param_id: i32, value: f32) -> Result<()> {
        self.send(&WireMessage::HostParam { param_id, value })
    }

    /// Forward a screenshot (PNG bytes) to the peer
    pub fn send_screenshot(&mut self, image: &[u8]) -> Result<()> {
        self.send(&WireMessage::Screenshot {
            image: image.to_vec(),
        })
    }

    /// Pack the current patch and push it to the peer.
    ///
    /// Flushes pending parameter writes, saves and cleans the autosave tree,
    /// then packs it in the transport's preferred snapshot form.
    pub fn deploy(&mut self, engine: &mut dyn PatchEngine) -> Result<()> {
        engine.prepare_save();
        engine.save_autosave()?;
        engine.clean_autosave()?;

        let snapshot = match self.transport.snapshot_format() {
            SnapshotFormat::Archive => PatchSnapshot::from_dir(engine.autosave_path())?,
            SnapshotFormat::RawDescription => {
                PatchSnapshot::from_description_file(engine.autosave_path())?
            }
        };

        debug!("deploying patch snapshot ({} bytes)", snapshot.as_bytes().len());
        self.first_contact = false;
        self.send(&WireMessage::Load {
            blob: snapshot.into_bytes(),
        })
    }

    /// Stop the transport. Safe to call repeatedly; once this returns no
    /// background handler can fire.
    pub fn close(&mut self) {
        self.transport.shutdown();
        self.flags.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Parse `udp://host[:port]` into a socket address, falling back to the
/// configured default port.
fn resolve_peer(address: &str) -> Result<SocketAddr> {
    let url = Url::parse(address)
        .map_err(|e| PatchlinkError::InvalidAddress(format!("{}: {}", address, e)))?;

    if url.scheme() != "udp" {
        return Err(PatchlinkError::InvalidAddress(format!(
            "unsupported scheme {:?} in {}",
            url.scheme(),
            address
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| PatchlinkError::InvalidAddress(format!("missing host in {}", address)))?;
    let port = url.port().unwrap_or_else(remote_port);

    (host, port)
        .to_socket_addrs()
        .map_err(|e| PatchlinkError::InvalidAddress(format!("{}: {}", address, e)))?
        .next()
        .ok_or_else(|| PatchlinkError::InvalidAddress(format!("unresolvable host in {}", address)))
}
