//! Wire protocol for the shell → vault configuration sync channel.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::{ConfigSyncMessage, HelloMessage, MessageType, PeerMessage};
