//! Auto-deploy change detection
//!
//! Watches the host's linear edit history once per UI frame and decides when
//! a full deployment should fire. The policy favors pushing the final
//! settled state over pushing every intermediate state:
//!
//! - the first observation after session creation only primes the detector;
//! - every index change records the new index and resets the debounce
//!   window, so a burst of edits defers deployment instead of queuing one
//!   per edit;
//! - continuous-drag actions (knob, slider, module movement) never arm a
//!   deployment on their own, as they fire once per frame while dragging;
//! - an armed deployment fires on the first frame at which the debounce
//!   window has elapsed since the last recorded change.

use tracing::warn;

use patchlink_engine::{EditActionKind, EditHistory, PatchEngine, ScreenshotSource};

use crate::session::RemoteSession;

/// Minimum quiet time between the last detected edit and a deployment
pub const DEBOUNCE_SECS: f64 = 1.0;

/// Debounced change detector over the host's edit history
#[derive(Debug, Default)]
pub struct AutoDeploy {
    last_index: Option<i64>,
    last_change_time: f64,
    armed: bool,
}

impl AutoDeploy {
    pub fn new() -> Self {
        Self::default()
    }

    /// One per-frame decision. Returns true when a deployment should fire.
    ///
    /// `index` and `action` come from the edit history; `now` is the
    /// caller's monotonic time in seconds.
    pub fn step(&mut self, index: i64, action: Option<&str>, now: f64) -> bool {
        let Some(last_index) = self.last_index else {
            // First observation since session creation: prime only, so a
            // pre-existing history never deploys before any real edit.
            self.last_index = Some(index);
            self.last_change_time = now;
            return false;
        };

        if index != last_index {
            self.last_index = Some(index);
            self.last_change_time = now;
            let kind = action
                .map(EditActionKind::classify)
                .unwrap_or(EditActionKind::Other);
            if !kind.is_continuous() {
                self.armed = true;
            }
            return false;
        }

        if self.armed && now - self.last_change_time >= DEBOUNCE_SECS {
            self.armed = false;
            self.last_change_time = now;
            return true;
        }

        false
    }

    /// Run one frame of the sync loop: drain the session, evaluate the
    /// policy, and on a positive decision deploy the patch and forward a
    /// fresh screenshot to peers that support it.
    pub fn process(
        &mut self,
        session: &mut RemoteSession,
        engine: &mut dyn PatchEngine,
        history: &dyn EditHistory,
        screenshots: &mut dyn ScreenshotSource,
        now: f64,
    ) {
        session.poll();

        if !session.auto_deploy() || !session.connected() {
            return;
        }

        let action = history.last_action_name();
        if !self.step(history.action_index(), action.as_deref(), now) {
            return;
        }

        if let Err(e) = session.deploy(engine) {
            warn!("auto-deploy failed: {}", e);
            return;
        }

        if session.peer_supports_screenshot() {
            if let Some(png) = screenshots.capture_screenshot() {
                if let Err(e) = session.send_screenshot(&png) {
                    warn!("screenshot forward failed: {}", e);
                }
            }
        }
    }
}
