//! patchlink-utils: Common utilities shared across patchlink crates
//!
//! This crate provides:
//! - Unified error types ([`PatchlinkError`], [`Result`])
//! - Logging infrastructure ([`init_logging`], [`LogConfig`])
//! - Remote-link configuration ([`config`] module)
//! - XDG-compliant path utilities ([`paths`] module)

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

// Re-export main types at crate root for convenience
pub use config::{remote_port, DEFAULT_REMOTE_PORT, REMOTE_PORT_ENV};
pub use error::{PatchlinkError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};

// Re-export commonly used path functions
pub use paths::{log_dir, runtime_dir, scratch_dir, state_dir};
