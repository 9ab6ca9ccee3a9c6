//! Framing codec for sync channel messages.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][seq:8][payload:N]
//! ```
//! Total header size: 16 bytes. Multi-byte integers are big-endian. The
//! payload is the JSON encoding of the per-type message struct — the
//! dominant payload is the configuration document itself, an arbitrary
//! nested mapping, so a self-describing encoding is required.
//!
//! The decoder is streaming-friendly: a short buffer yields
//! [`ProtocolError::InsufficientData`] (keep reading), while corrupt input
//! yields a distinct error (close the connection). A read loop accumulates
//! bytes and calls [`decode_message`] until it reports insufficient data,
//! because a single `read()` may deliver a partial message or several
//! coalesced ones.

use thiserror::Error;

use crate::protocol::messages::{
    ConfigSyncMessage, HelloMessage, MessageType, PeerMessage, HEADER_SIZE, PROTOCOL_VERSION,
};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The buffer does not yet hold a complete message; read more bytes.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload bytes could not be parsed as the declared message type.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The message could not be serialized for sending.
    #[error("payload serialization failed: {0}")]
    Serialize(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`PeerMessage`] into a byte vector including the 16-byte header.
///
/// The sequence number is not generated here — pass a pre-incremented value
/// from the sender's counter so receivers can observe per-connection FIFO
/// ordering.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if the payload cannot be serialized.
pub fn encode_message(msg: &PeerMessage, sequence_number: u64) -> Result<Vec<u8>, ProtocolError> {
    let payload = match msg {
        PeerMessage::Hello(m) => serde_json::to_vec(m),
        PeerMessage::ConfigSync(m) => serde_json::to_vec(m),
    }
    .map_err(|e| ProtocolError::Serialize(e.to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    // Header: version (1) + msg_type (1) + reserved (2) + payload_len (4) +
    //         seq (8) = 16 bytes
    buf.push(PROTOCOL_VERSION);
    buf.push(msg.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&sequence_number.to_be_bytes());

    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one [`PeerMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] while the buffer is short of
/// one complete message, and other variants for corrupt input.
pub fn decode_message(bytes: &[u8]) -> Result<(PeerMessage, usize), ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let msg_type_byte = bytes[1];
    let msg_type = MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    let payload = &bytes[HEADER_SIZE..total_needed];
    let msg = decode_payload(msg_type, payload)?;
    Ok((msg, total_needed))
}

/// Reads the sequence number out of an encoded message header.
pub fn sequence_number(bytes: &[u8]) -> Option<u64> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }
    let mut seq = [0u8; 8];
    seq.copy_from_slice(&bytes[8..16]);
    Some(u64::from_be_bytes(seq))
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_payload(msg_type: MessageType, payload: &[u8]) -> Result<PeerMessage, ProtocolError> {
    match msg_type {
        MessageType::Hello => serde_json::from_slice::<HelloMessage>(payload)
            .map(PeerMessage::Hello)
            .map_err(|e| ProtocolError::MalformedPayload(format!("Hello: {e}"))),
        MessageType::ConfigSync => serde_json::from_slice::<ConfigSyncMessage>(payload)
            .map(PeerMessage::ConfigSync)
            .map_err(|e| ProtocolError::MalformedPayload(format!("ConfigSync: {e}"))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
