//! patchlink-client: Initiator side of the remote patch-mirroring link
//!
//! A [`RemoteSession`] mirrors the local patch to one peer: a networked
//! companion process reached over UDP, or another subsystem of the same
//! host reached through its get/set-state surface (direct-access mode).
//! Callers hold at most one session, owned by a [`RemoteContext`], and stay
//! agnostic of which transport variant is underneath.
//!
//! The [`AutoDeploy`] detector watches the host's edit history once per UI
//! frame and pushes a full snapshot (plus a fresh screenshot) whenever local
//! edits have settled.

pub mod autodeploy;
pub mod context;
pub mod session;
pub mod transport;

pub use autodeploy::{AutoDeploy, DEBOUNCE_SECS};
pub use context::RemoteContext;
pub use session::{RemoteSession, TransportMode};
pub use transport::{SessionFlags, SnapshotFormat, Transport};
