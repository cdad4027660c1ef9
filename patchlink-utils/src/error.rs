//! Error types for patchlink
//!
//! Provides a unified error type used across all patchlink crates.

use std::path::PathBuf;

/// Main error type for patchlink operations
#[derive(Debug, thiserror::Error)]
pub enum PatchlinkError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind socket: {0}")]
    Bind(std::io::Error),

    #[error("Session is not connected")]
    NotConnected,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Archive Errors ===

    #[error("Corrupt snapshot archive: {0}")]
    CorruptArchive(String),

    #[error("Archive entry escapes target directory: {0}")]
    UnsafeArchivePath(String),

    // === Engine Errors ===

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(i64),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PatchlinkError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a corrupt-archive error
    pub fn corrupt_archive(msg: impl Into<String>) -> Self {
        Self::CorruptArchive(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using PatchlinkError
pub type Result<T> = std::result::Result<T, PatchlinkError>;
