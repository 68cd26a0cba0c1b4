//! SSH error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during SSH operations
#[derive(Debug, Error)]
pub enum SshError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed for {username}@{host}")]
    Authentication { host: String, username: String },

    #[error("Failed to load SSH key {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },

    #[error("Remote directory not found: {path}")]
    RemoteDirectory { path: String },

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Command dispatch failed: {0}")]
    CommandDispatch(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH protocol error: {0}")]
    Protocol(String),
}

impl From<russh::Error> for SshError {
    fn from(e: russh::Error) -> Self {
        SshError::Protocol(e.to_string())
    }
}

/// Result type for SSH operations
pub type SshResult<T> = std::result::Result<T, SshError>;
