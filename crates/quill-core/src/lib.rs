//! # quill-core
//!
//! Shared library for Quill containing the configuration document model,
//! change records and comparators, the ordered change emitter, and the wire
//! protocol used to relay configuration changes between the two process
//! roles.
//!
//! This crate is used by both the vault (storage-owning) and shell
//! (UI-capable) applications. It has zero dependencies on OS APIs, the file
//! system, or network sockets.
//!
//! Module map:
//!
//! - **`domain`** – Pure data types: the nested configuration [`Document`]
//!   addressed by dotted paths, the [`ChangeRecord`] that travels with every
//!   notification, and the tagged [`RemoteAuth`] credential descriptor with
//!   its structural change predicate.
//!
//! - **`emitter`** – A synchronous, ordered publish/subscribe channel for
//!   `Changed` / `ChangeFailed` notifications. Delivery happens on the task
//!   that committed the change, in listener registration order.
//!
//! - **`protocol`** – How a committed change travels from the shell to the
//!   vault: message types and a length-framed codec with streaming decode.

// Declare the top-level modules. Rust will look for each in a subdirectory
// or file with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod emitter;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `quill_core::Document` instead of `quill_core::domain::document::Document`.
pub use domain::change::{ChangeRecord, Comparator};
pub use domain::document::Document;
pub use domain::remote_auth::RemoteAuth;
pub use emitter::{ChangeEmitter, ConfigEvent, ListenerId};
pub use protocol::codec::{decode_message, encode_message, sequence_number, ProtocolError};
pub use protocol::messages::{ConfigSyncMessage, HelloMessage, PeerMessage};
