//! Inbound message dispatch
//!
//! Every valid request expecting a reply is answered exactly once; malformed
//! input is answered not at all. No failure tears down the server or stops
//! the receive loop; everything is local to the datagram that caused it.

use std::net::{SocketAddr, UdpSocket};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, warn};

use patchlink_protocol::{codec, Capabilities, PatchSnapshot, ReplyKind, WireMessage};
use patchlink_utils::Result;

use crate::server::SharedHost;

/// State key receiving base64 PNG screenshots on the embedding host
pub const SCREENSHOT_KEY: &str = "screenshot";

/// Decode and dispatch one datagram. Runs on whichever thread owns the
/// receive loop; never on the realtime audio path.
pub(crate) fn handle_datagram(
    socket: &UdpSocket,
    src: SocketAddr,
    data: &[u8],
    capabilities: Capabilities,
    host: &SharedHost,
) {
    let Some(msg) = codec::decode_datagram(data) else {
        debug!("dropping malformed datagram ({} bytes) from {}", data.len(), src);
        return;
    };
    dispatch(socket, src, msg, capabilities, host);
}

fn dispatch(
    socket: &UdpSocket,
    src: SocketAddr,
    msg: WireMessage,
    capabilities: Capabilities,
    host: &SharedHost,
) {
    match msg {
        WireMessage::Hello => {
            debug!("hello from {}, greeting back", src);
            // Feature list first, then the hello reply.
            reply(
                socket,
                src,
                &WireMessage::resp(ReplyKind::Features, capabilities.to_tokens()),
            );
            reply(socket, src, &WireMessage::resp(ReplyKind::Hello, "ok"));
        }

        WireMessage::Load { blob } => {
            let ok = match apply_load(&blob, host) {
                Ok(()) => true,
                Err(e) => {
                    // The previously-loaded patch is untouched.
                    warn!("patch load failed: {}", e);
                    false
                }
            };
            reply(socket, src, &WireMessage::status_resp(ReplyKind::Load, ok));
        }

        WireMessage::Param {
            module_id,
            param_id,
            value,
        } => {
            if let Err(e) = host.lock().set_param_value(module_id, param_id, value) {
                warn!("param push rejected: {}", e);
            }
        }

        WireMessage::HostParam { param_id, value } => {
            let mut host = host.lock();
            if param_id >= 0 && (param_id as u32) < host.host_param_count() {
                host.set_host_param(param_id as u32, value);
            } else {
                debug!("dropping out-of-range host param {}", param_id);
            }
        }

        WireMessage::Screenshot { image } => {
            if !capabilities.screenshot {
                // Not advertised at hello time, so no reply either.
                debug!("dropping screenshot; forwarding not supported");
                return;
            }
            let ok = host.lock().set_state(SCREENSHOT_KEY, &BASE64.encode(&image));
            reply(
                socket,
                src,
                &WireMessage::status_resp(ReplyKind::Screenshot, ok),
            );
        }

        WireMessage::Resp { kind, .. } => {
            debug!("ignoring stray reply {:?} from {}", kind, src);
        }
    }
}

/// Unpack a snapshot blob into the autosave tree and reload the patch.
///
/// The swap is all-or-nothing: unpack validates and refills the scratch
/// directory before the engine is asked to reload, and a reload failure is
/// reported identically to a corrupt blob.
fn apply_load(blob: &[u8], host: &SharedHost) -> Result<()> {
    let snapshot = PatchSnapshot::from_bytes(blob.to_vec());
    let mut host = host.lock();
    let dir = host.autosave_path().to_path_buf();
    snapshot.unpack_into(&dir)?;
    host.load_autosave()
}

/// Fire-and-forget reply to the datagram source
fn reply(socket: &UdpSocket, src: SocketAddr, msg: &WireMessage) {
    let wire = codec::encode_datagram(msg);
    if let Err(e) = socket.send_to(&wire, src) {
        debug!("dropped reply {}: {}", msg.address(), e);
    }
}
