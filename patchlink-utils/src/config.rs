//! Remote-link configuration
//!
//! The remote peer listens on one well-known UDP port. It can be overridden
//! through the environment, read once at startup and cached for the process
//! lifetime.

use std::sync::OnceLock;

use tracing::warn;

/// Default UDP port the remote peer listens on
pub const DEFAULT_REMOTE_PORT: u16 = 2228;

/// Environment variable overriding [`DEFAULT_REMOTE_PORT`]
pub const REMOTE_PORT_ENV: &str = "PATCHLINK_REMOTE_PORT";

static REMOTE_PORT: OnceLock<u16> = OnceLock::new();

/// The UDP port used for remote sessions.
///
/// Reads `PATCHLINK_REMOTE_PORT` on first call; an unparseable value is
/// logged and ignored in favor of the default.
pub fn remote_port() -> u16 {
    *REMOTE_PORT.get_or_init(|| match std::env::var(REMOTE_PORT_ENV) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", REMOTE_PORT_ENV, raw);
            DEFAULT_REMOTE_PORT
        }),
        Err(_) => DEFAULT_REMOTE_PORT,
    })
}
