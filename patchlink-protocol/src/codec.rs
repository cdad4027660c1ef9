//! Binary datagram codec
//!
//! Each datagram encodes one message: a NUL-terminated address string, a
//! NUL-terminated type-tag string (leading comma), then the arguments in
//! signature order. Every field is padded to a 4-byte boundary; numeric
//! arguments are big-endian; blobs are length-prefixed.
//!
//! Decoding is strict: both the address and the exact argument-type
//! signature must match a known message, otherwise the datagram is an
//! unknown message and `decode_datagram` yields `None`. This keeps a
//! malformed or version-mismatched peer from reaching engine state through
//! type confusion.

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::messages::WireMessage;

/// Encode one message as a datagram payload
pub fn encode_datagram(msg: &WireMessage) -> Vec<u8> {
    let mut buf = BytesMut::new();

    put_padded_str(&mut buf, msg.address());
    let mut tags = String::with_capacity(1 + msg.type_tags().len());
    tags.push(',');
    tags.push_str(msg.type_tags());
    put_padded_str(&mut buf, &tags);

    match msg {
        WireMessage::Hello => {}
        WireMessage::HostParam { param_id, value } => {
            buf.put_i32(*param_id);
            buf.put_f32(*value);
        }
        WireMessage::Load { blob } => put_blob(&mut buf, blob),
        WireMessage::Param {
            module_id,
            param_id,
            value,
        } => {
            buf.put_i64(*module_id);
            buf.put_i32(*param_id);
            buf.put_f32(*value);
        }
        WireMessage::Screenshot { image } => put_blob(&mut buf, image),
        WireMessage::Resp { kind, payload } => {
            put_padded_str(&mut buf, kind);
            put_padded_str(&mut buf, payload);
        }
    }

    buf.to_vec()
}

/// Decode one datagram payload.
///
/// Returns `None` for anything that is not a well-formed known message:
/// unknown address, signature mismatch, truncation, bad UTF-8. Callers log
/// and drop those; they never dispatch.
pub fn decode_datagram(data: &[u8]) -> Option<WireMessage> {
    let mut rest = data;

    let address = read_padded_str(&mut rest)?;
    let tags = read_padded_str(&mut rest)?;
    let tags = tags.strip_prefix(',')?;

    let msg = match (address.as_str(), tags) {
        ("/hello", "") => WireMessage::Hello,
        ("/host-param", "if") => WireMessage::HostParam {
            param_id: read_i32(&mut rest)?,
            value: read_f32(&mut rest)?,
        },
        ("/load", "b") => WireMessage::Load {
            blob: read_blob(&mut rest)?,
        },
        ("/param", "hif") => WireMessage::Param {
            module_id: read_i64(&mut rest)?,
            param_id: read_i32(&mut rest)?,
            value: read_f32(&mut rest)?,
        },
        ("/screenshot", "b") => WireMessage::Screenshot {
            image: read_blob(&mut rest)?,
        },
        ("/resp", "ss") => WireMessage::Resp {
            kind: read_padded_str(&mut rest)?,
            payload: read_padded_str(&mut rest)?,
        },
        _ => {
            debug!("unknown message {:?} with tags {:?}", address, tags);
            return None;
        }
    };

    Some(msg)
}

/// Round a length up to the next 4-byte boundary
fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

fn put_padded_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    // NUL terminator plus padding to the boundary
    let padded = pad4(s.len() + 1);
    buf.put_bytes(0, padded - s.len());
}

fn put_blob(buf: &mut BytesMut, data: &[u8]) {
    buf.put_i32(data.len() as i32);
    buf.put_slice(data);
    buf.put_bytes(0, pad4(data.len()) - data.len());
}

fn read_padded_str(rest: &mut &[u8]) -> Option<String> {
    let nul = rest.iter().position(|&b| b == 0)?;
    let s = std::str::from_utf8(&rest[..nul]).ok()?.to_owned();
    let consumed = pad4(nul + 1);
    if rest.len() < consumed {
        return None;
    }
    *rest = &rest[consumed..];
    Some(s)
}

fn read_i32(rest: &mut &[u8]) -> Option<i32> {
    let bytes: [u8; 4] = rest.get(..4)?.try_into().ok()?;
    *rest = &rest[4..];
    Some(i32::from_be_bytes(bytes))
}

fn read_i64(rest: &mut &[u8]) -> Option<i64> {
    let bytes: [u8; 8] = rest.get(..8)?.try_into().ok()?;
    *rest = &rest[8..];
    Some(i64::from_be_bytes(bytes))
}

fn read_f32(rest: &mut &[u8]) -> Option<f32> {
    let bytes: [u8; 4] = rest.get(..4)?.try_into().ok()?;
    *rest = &rest[4..];
    Some(f32::from_be_bytes(bytes))
}

fn read_blob(rest: &mut &[u8]) -> Option<Vec<u8>> {
    let size = read_i32(rest)?;
    if size < 0 {
        return None;
    }
    let size = size as usize;
    let data = rest.get(..size)?.to_vec();
    let consumed = pad4(size);
    if rest.len() < consumed {
        // Padding is allowed to be absent only at the very end of the
        // datagram when the blob is the last argument.
        if rest.len() < size {
            return None;
        }
        *rest = &rest[size..];
    } else {
        *rest = &rest[consumed..];
    }
    Some(data)
}
