//! patchlink-server: Peer side of the remote patch-mirroring link
//!
//! A [`RemoteServer`] listens on the well-known UDP port for an editor's
//! handshake, patch snapshots, parameter pushes and screenshots, and applies
//! them to the embedding host through the `patchlink-engine` traits. It runs
//! either on its own background thread or cooperatively from the host's
//! idle loop; handlers never touch the realtime audio path.

pub mod handlers;
pub mod server;

pub use server::{RemoteServer, ServerMode, SharedHost};
