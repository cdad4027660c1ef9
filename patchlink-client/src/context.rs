//! Owned session handle
//!
//! At most one remote session exists per local instance. The handle lives in
//! an explicit context owned by the UI or headless server driving the link;
//! reconnecting replaces the owned handle, never a hidden global.

use tracing::info;

use patchlink_engine::HostState;
use patchlink_utils::Result;

use crate::session::{RemoteSession, TransportMode};

/// Owner of the (at most one) remote session
#[derive(Default)]
pub struct RemoteContext {
    session: Option<RemoteSession>,
}

impl RemoteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to a networked peer, tearing down any existing session first.
    ///
    /// On connect failure the context is left with no session.
    pub fn connect(&mut self, address: &str, mode: TransportMode) -> Result<&mut RemoteSession> {
        self.disconnect();
        let session = RemoteSession::connect(address, mode)?;
        Ok(self.session.insert(session))
    }

    /// Open a direct-access session, tearing down any existing session first
    pub fn connect_direct(&mut self, host: Box<dyn HostState + Send>) -> &mut RemoteSession {
        self.disconnect();
        self.session.insert(RemoteSession::direct(host))
    }

    /// Tear down the current session, if any. Always safe; guarantees no
    /// background callback fires after return.
    pub fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            info!("remote session to {} closed", session.address());
        }
    }

    pub fn session(&self) -> Option<&RemoteSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut RemoteSession> {
        self.session.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHost;
    impl HostState for NullHost {
        fn set_state(&mut self, _key: &str, _value: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_empty_context() {
        let mut ctx = RemoteContext::new();
        assert!(ctx.session().is_none());
        // Disconnect with no session is a no-op.
        ctx.disconnect();
    }

    #[test]
    fn test_connect_direct_replaces_session() {
        let mut ctx = RemoteContext::new();
        ctx.connect_direct(Box::new(NullHost));
        assert!(ctx.session().is_some());
        assert!(ctx.session().unwrap().connected());

        // A second connect replaces the first session.
        ctx.connect_direct(Box::new(NullHost));
        assert!(ctx.session().is_some());

        ctx.disconnect();
        assert!(ctx.session().is_none());
    }

    #[test]
    fn test_failed_connect_leaves_no_session() {
        let mut ctx = RemoteContext::new();
        ctx.connect_direct(Box::new(NullHost));
        assert!(ctx
            .connect("tcp://bad-scheme:1", TransportMode::Polled)
            .is_err());
        // The old session was torn down before the attempt.
        assert!(ctx.session().is_none());
    }
}
