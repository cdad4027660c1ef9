//! patchlink-engine: Boundary traits to the embedding host
//!
//! The remote-sync layer never owns the audio engine, the patch graph, the
//! edit history or the screenshot machinery; it drives them through the
//! traits defined here. The host wires its own implementations in.
//!
//! None of these calls may be made from the realtime audio-render path.

pub mod history;

use std::path::Path;

use patchlink_utils::Result;

pub use history::{EditActionKind, EditHistory};

/// Access to the host's patch engine and its autosave scratch directory.
///
/// `save_autosave` materializes the live patch graph into the scratch
/// directory; `load_autosave` replaces the live patch from it. Both run on
/// the control thread.
pub trait PatchEngine {
    /// Flush pending parameter writes into the in-memory patch graph
    fn prepare_save(&mut self);

    /// Write the patch graph to the autosave scratch directory
    fn save_autosave(&mut self) -> Result<()>;

    /// Remove stale files from the autosave scratch directory
    fn clean_autosave(&mut self) -> Result<()>;

    /// Reload the live patch from the autosave scratch directory
    fn load_autosave(&mut self) -> Result<()>;

    /// The autosave scratch directory
    fn autosave_path(&self) -> &Path;

    /// Set one module parameter. Fails with `ModuleNotFound` when the
    /// module id does not resolve.
    fn set_param_value(&mut self, module_id: i64, param_id: i32, value: f32) -> Result<()>;

    /// Number of host-exposed parameters
    fn host_param_count(&self) -> u32;

    /// Store a host parameter value. Caller has already bounds-checked the id.
    fn set_host_param(&mut self, param_id: u32, value: f32);
}

/// The host's generic key/value state surface.
///
/// Used by the direct-access transport (no socket) and by the remote peer
/// to forward screenshots to its embedding plugin.
pub trait HostState {
    /// Set a state value; returns false when the host rejected the key
    fn set_state(&mut self, key: &str, value: &str) -> bool;
}

/// Fresh screenshot capture, requested after each auto-deploy.
pub trait ScreenshotSource {
    /// Capture the current patch view as PNG bytes, if available
    fn capture_screenshot(&mut self) -> Option<Vec<u8>>;
}

/// Convenience for hosts whose engine also exposes the state surface
pub trait RemoteHost: PatchEngine + HostState {}

impl<T: PatchEngine + HostState> RemoteHost for T {}
