//! Session transports
//!
//! Two structurally different transports present one logical API: the UDP
//! transports (polled or background-thread) and the in-process direct-access
//! transport. Sessions hold a `Box<dyn Transport>` and never branch on the
//! variant.

pub mod direct;
pub mod udp;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use patchlink_protocol::{Capabilities, ReplyKind, WireMessage};
use patchlink_utils::Result;

pub use direct::DirectTransport;
pub use udp::{PolledUdpTransport, ThreadedUdpTransport};

/// Which snapshot form a transport carries in `/load`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Compressed archive of the whole autosave tree (networked transports)
    Archive,
    /// Raw top-level description file (in-process transport)
    RawDescription,
}

/// One peer connection, sending fire-and-forget and receiving replies.
///
/// `shutdown` must not return while a background receiver can still run;
/// that guarantee is what makes disconnect safe against teardown races.
pub trait Transport: Send {
    /// Serialize and transmit one message. No delivery guarantee; never
    /// blocks, never called from the realtime audio path.
    fn send(&mut self, msg: &WireMessage) -> Result<()>;

    /// Drain all pending inbound datagrams without sleeping.
    /// No-op for transports that receive on their own thread (or not at all).
    fn poll(&mut self) {}

    /// Stop any background receiver before returning. Idempotent.
    fn shutdown(&mut self) {}

    /// Snapshot form this transport expects in `/load`
    fn snapshot_format(&self) -> SnapshotFormat {
        SnapshotFormat::Archive
    }
}

/// Connection state shared between the control thread and a background
/// receive thread. Plain word-sized atomics, no lock: the receive side only
/// ever stores, the control side only ever loads.
#[derive(Debug, Default)]
pub struct SessionFlags {
    pub connected: AtomicBool,
    pub peer_supports_screenshot: AtomicBool,
}

impl SessionFlags {
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn peer_supports_screenshot(&self) -> bool {
        self.peer_supports_screenshot.load(Ordering::SeqCst)
    }
}

/// Apply one inbound message to the session flags.
///
/// Only `/resp` flows peer-to-initiator; anything else is logged and
/// dropped. Runs on whichever thread owns the receive loop.
pub(crate) fn apply_inbound(flags: &SessionFlags, msg: WireMessage) {
    let WireMessage::Resp { kind, payload } = msg else {
        debug!("dropping unexpected inbound message {:?}", msg.address());
        return;
    };

    match ReplyKind::parse(&kind) {
        Some(ReplyKind::Hello) => {
            if payload == "ok" {
                flags.connected.store(true, Ordering::SeqCst);
                debug!("handshake acknowledged by peer");
            }
        }
        Some(ReplyKind::Features) => {
            let caps = Capabilities::from_tokens(&payload);
            flags
                .peer_supports_screenshot
                .store(caps.screenshot, Ordering::SeqCst);
            debug!("peer features: {:?}", caps);
        }
        Some(ReplyKind::Load) | Some(ReplyKind::Screenshot) => {
            // Purely informational; the initiator never awaits these.
            if payload != "ok" {
                warn!("peer reported {} {}", kind, payload);
            } else {
                debug!("peer reported {} ok", kind);
            }
        }
        None => debug!("dropping reply of unknown kind {:?}", kind),
    }
}
