//! Direct-access transport
//!
//! Used when the "peer" is another subsystem of the same host, reachable
//! only through its generic set-state call. There is no socket and no real
//! network hop; messages are translated into state writes so the change
//! detector and every other caller stay transport-agnostic.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, warn};

use patchlink_engine::HostState;
use patchlink_protocol::WireMessage;
use patchlink_utils::Result;

use super::{SnapshotFormat, Transport};

/// State key receiving the raw patch description
pub const PATCH_KEY: &str = "patch";
/// State key receiving base64 PNG screenshots
pub const SCREENSHOT_KEY: &str = "screenshot";
/// State key receiving `module:param:value` parameter changes
pub const PARAM_KEY: &str = "param";

/// In-process transport over the host's set-state surface
pub struct DirectTransport {
    host: Box<dyn HostState + Send>,
}

impl DirectTransport {
    pub fn new(host: Box<dyn HostState + Send>) -> Self {
        Self { host }
    }

    fn set_state(&mut self, key: &str, value: &str) {
        if !self.host.set_state(key, value) {
            warn!("host rejected state key {:?}", key);
        }
    }
}

impl Transport for DirectTransport {
    fn send(&mut self, msg: &WireMessage) -> Result<()> {
        match msg {
            WireMessage::Hello => {
                // Nothing to hand-shake with; the session is born connected.
            }
            WireMessage::Load { blob } => match std::str::from_utf8(blob) {
                Ok(text) => self.set_state(PATCH_KEY, text),
                Err(_) => warn!("dropping non-textual patch blob in direct mode"),
            },
            WireMessage::Param {
                module_id,
                param_id,
                value,
            } => {
                let encoded = format!("{}:{}:{}", module_id, param_id, value);
                self.set_state(PARAM_KEY, &encoded);
            }
            WireMessage::Screenshot { image } => {
                self.set_state(SCREENSHOT_KEY, &BASE64.encode(image));
            }
            WireMessage::HostParam { .. } | WireMessage::Resp { .. } => {
                debug!("no direct-access mapping for {}", msg.address());
            }
        }
        Ok(())
    }

    fn snapshot_format(&self) -> SnapshotFormat {
        SnapshotFormat::RawDescription
    }
}
