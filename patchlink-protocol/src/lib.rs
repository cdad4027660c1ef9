//! patchlink-protocol: Shared wire definitions for remote patch mirroring
//!
//! This crate defines the fixed message set exchanged between an editor and
//! its remote peer (one message per UDP datagram), the binary datagram codec,
//! and the patch-snapshot blob format used by `/load`.

pub mod codec;
pub mod messages;
pub mod snapshot;

// Re-export main types at crate root
pub use codec::{decode_datagram, encode_datagram};
pub use messages::{Capabilities, ReplyKind, ReplyStatus, WireMessage};
pub use snapshot::{PatchSnapshot, DESCRIPTION_FILE};
