//! Secondary-side seam of the process bridge.
//!
//! The store stays socket-free: it talks to the bridge through this trait,
//! and the shell binary plugs in the TCP implementation. The channel is
//! one-directional (secondary → primary) and best-effort — a send failure is
//! reported to the caller, who logs it and moves on, because the bridge
//! guarantees no delivery across a vault restart anyway.

use async_trait::async_trait;
use thiserror::Error;

use quill_core::ConfigSyncMessage;

/// Error type for sync relay sends.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay has no live connection to the primary.
    #[error("sync channel is not connected")]
    NotConnected,

    /// The message could not be written to the channel.
    #[error("sync send failed: {0}")]
    Send(String),
}

/// Forwards a committed configuration change to the primary role.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncRelay: Send + Sync {
    async fn forward(&self, message: ConfigSyncMessage) -> Result<(), RelayError>;
}
