//! TCP connection from the shell to the vault's sync channel.
//!
//! The sending half of the process bridge. The channel is one-directional:
//! the shell writes framed messages, the vault never writes back, so the
//! read half of the stream is dropped at connect time. A monotonically
//! increasing sequence number goes into every frame header so the vault
//! observes per-connection FIFO ordering.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use quill_app::{RelayError, SyncRelay};
use quill_core::protocol::messages::{HelloMessage, PROTOCOL_VERSION};
use quill_core::{encode_message, ConfigSyncMessage, PeerMessage};

/// One-directional relay to the vault.
///
/// Owns the write half of the loopback connection behind an async mutex so
/// overlapping commits cannot interleave their frames.
pub struct TcpSyncRelay {
    write_half: Mutex<tokio::net::tcp::OwnedWriteHalf>,
    sequence: AtomicU64,
}

impl TcpSyncRelay {
    /// Connects to the vault and identifies this shell with a Hello frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection cannot be established (the
    /// vault is not running, the address is wrong) or the Hello cannot be
    /// written.
    pub async fn connect(vault_addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(vault_addr)
            .await
            .with_context(|| format!("failed to connect to the vault at {vault_addr}"))?;

        let (read_half, write_half) = stream.into_split();
        // Nothing flows vault → shell on this channel.
        drop(read_half);

        let relay = Self {
            write_half: Mutex::new(write_half),
            sequence: AtomicU64::new(0),
        };
        relay
            .send(&PeerMessage::Hello(HelloMessage {
                peer_id: Uuid::new_v4(),
                protocol_version: PROTOCOL_VERSION,
                peer_name: "quill-shell".to_string(),
            }))
            .await
            .context("failed to introduce the shell to the vault")?;

        debug!("connected to the vault at {vault_addr}");
        Ok(relay)
    }

    async fn send(&self, message: &PeerMessage) -> Result<(), RelayError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let bytes =
            encode_message(message, sequence).map_err(|e| RelayError::Send(e.to_string()))?;

        let mut write_half = self.write_half.lock().await;
        // write_all pushes every byte out even when the OS accepts only a
        // partial write first.
        write_half
            .write_all(&bytes)
            .await
            .map_err(|e| RelayError::Send(e.to_string()))
    }
}

#[async_trait]
impl SyncRelay for TcpSyncRelay {
    async fn forward(&self, message: ConfigSyncMessage) -> Result<(), RelayError> {
        self.send(&PeerMessage::ConfigSync(message)).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{decode_message, sequence_number, ChangeRecord, Document, ProtocolError};
    use serde_json::json;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Reads exactly one framed message off the stream, buffering across
    /// partial reads the way the vault's receive loop does.
    async fn read_one_message(stream: &mut TcpStream, buf: &mut Vec<u8>) -> PeerMessage {
        let mut tmp = [0u8; 4096];
        loop {
            match decode_message(buf) {
                Ok((message, consumed)) => {
                    buf.drain(..consumed);
                    return message;
                }
                Err(ProtocolError::InsufficientData { .. }) => {
                    let n = stream.read(&mut tmp).await.expect("read");
                    assert!(n > 0, "peer closed before a full message arrived");
                    buf.extend_from_slice(&tmp[..n]);
                }
                Err(e) => panic!("decode error: {e}"),
            }
        }
    }

    #[tokio::test]
    async fn test_connect_sends_hello_first() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            read_one_message(&mut stream, &mut buf).await
        });

        let _relay = TcpSyncRelay::connect(addr).await.expect("connect");

        let first = accept.await.expect("join");
        match first {
            PeerMessage::Hello(hello) => {
                assert_eq!(hello.peer_name, "quill-shell");
                assert_eq!(hello.protocol_version, PROTOCOL_VERSION);
            }
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forward_delivers_config_sync_after_hello() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            let first = read_one_message(&mut stream, &mut buf).await;
            let second = read_one_message(&mut stream, &mut buf).await;
            (first, second)
        });

        let relay = TcpSyncRelay::connect(addr).await.expect("connect");
        let message = ConfigSyncMessage {
            document: Document::from_value(json!({"noteDir": "/notes"})).expect("object"),
            change: ChangeRecord::new("noteDir", json!("/notes"), None),
        };
        relay.forward(message.clone()).await.expect("forward");

        let (first, second) = accept.await.expect("join");
        assert!(matches!(first, PeerMessage::Hello(_)));
        assert_eq!(second, PeerMessage::ConfigSync(message));
    }

    #[tokio::test]
    async fn test_frames_carry_increasing_sequence_numbers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut tmp = [0u8; 4096];
            // Pull bytes until two complete frames are buffered.
            loop {
                let n = stream.read(&mut tmp).await.expect("read");
                assert!(n > 0);
                raw.extend_from_slice(&tmp[..n]);
                if let Ok((_, consumed)) = decode_message(&raw) {
                    if decode_message(&raw[consumed..]).is_ok() {
                        let first_seq = sequence_number(&raw).expect("seq");
                        let second_seq = sequence_number(&raw[consumed..]).expect("seq");
                        return (first_seq, second_seq);
                    }
                }
            }
        });

        let relay = TcpSyncRelay::connect(addr).await.expect("connect");
        relay
            .forward(ConfigSyncMessage {
                document: Document::new(),
                change: ChangeRecord::new("debug", json!(true), None),
            })
            .await
            .expect("forward");

        let (first_seq, second_seq) = accept.await.expect("join");
        assert_eq!(first_seq, 0, "hello takes the first sequence number");
        assert_eq!(second_seq, 1);
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind an ephemeral port, then free it so nothing is listening.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("local addr")
        };

        let result = TcpSyncRelay::connect(addr).await;
        assert!(result.is_err(), "connect to a closed port must fail");
    }
}
