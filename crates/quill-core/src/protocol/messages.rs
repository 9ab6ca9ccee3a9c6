//! Sync channel message types.
//!
//! The channel is one-directional: the shell (secondary role) sends, the
//! vault (primary role) receives. Delivery order is FIFO per connection;
//! nothing is replayed across a vault restart, so an undelivered message is
//! simply lost.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::change::ChangeRecord;
use crate::domain::document::Document;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 16;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type codes carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    Hello = 0x01,
    ConfigSync = 0x02,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::Hello),
            0x02 => Ok(MessageType::ConfigSync),
            _ => Err(()),
        }
    }
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// HELLO (0x01): sent by the shell once after connecting, identifying the
/// peer for the vault's logs. Carries no configuration data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloMessage {
    /// UUID v4 identifying this shell instance for the connection's lifetime.
    pub peer_id: Uuid,
    /// Protocol version the shell speaks; informational, the header version
    /// byte is authoritative.
    pub protocol_version: u8,
    /// Human-readable peer name.
    pub peer_name: String,
}

/// CONFIG_SYNC (0x02): a committed configuration change.
///
/// Carries the full document snapshot (the vault replaces its document
/// wholesale) plus the change record, so the vault can re-emit the same
/// notification to its own subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSyncMessage {
    pub document: Document,
    pub change: ChangeRecord,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid sync channel messages, discriminated by type.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerMessage {
    Hello(HelloMessage),
    ConfigSync(ConfigSyncMessage),
}

impl PeerMessage {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            PeerMessage::Hello(_) => MessageType::Hello,
            PeerMessage::ConfigSync(_) => MessageType::ConfigSync,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
