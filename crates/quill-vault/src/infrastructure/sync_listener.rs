//! Loopback TCP listener for configuration sync messages from the shell.
//!
//! The receiving half of the process bridge. Each connection runs a
//! streaming decode loop: TCP is a stream protocol, so a single `read()`
//! may deliver less than one complete message or several coalesced ones.
//! Received bytes accumulate in a buffer and [`quill_core::decode_message`]
//! extracts complete messages one at a time, treating insufficient-data as
//! "keep reading" and any other decode error as a dead connection.
//!
//! Every decoded `ConfigSync` is fed to
//! [`ConfigStore::apply_remote_update`] — that call is the bridge's single
//! registered handler. Ordering is FIFO per connection; nothing is replayed
//! across a vault restart, so messages sent while the vault is down are
//! lost by design.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use quill_app::ConfigStore;
use quill_core::{decode_message, PeerMessage, ProtocolError};

/// Default TCP port of the vault's sync channel.
pub const DEFAULT_SYNC_PORT: u16 = 27183;

/// Accepts shell connections and applies their configuration updates.
pub struct SyncListener {
    listener: TcpListener,
}

impl SyncListener {
    /// Binds the sync channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is already in use or cannot be
    /// bound.
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind sync listener on {addr}"))?;
        Ok(Self { listener })
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("sync listener has no local address")
    }

    /// Accept loop; runs until `running` is cleared. Each connection gets
    /// its own task feeding the store.
    pub async fn run(self, store: Arc<ConfigStore>, running: Arc<AtomicBool>) {
        while running.load(Ordering::Relaxed) {
            // Accept with a short timeout so the shutdown flag is re-checked
            // even when no shell ever connects.
            match tokio::time::timeout(Duration::from_millis(200), self.listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    debug!("sync peer connected from {peer}");
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        handle_peer(stream, store).await;
                        debug!("sync peer {peer} disconnected");
                    });
                }
                Ok(Err(e)) => warn!("sync accept failed: {e}"),
                Err(_) => {} // timeout — loop around and re-check the flag
            }
        }
        info!("sync listener stopped");
    }
}

/// Per-connection receive loop.
async fn handle_peer(mut stream: TcpStream, store: Arc<ConfigStore>) {
    // Streaming receive buffer — accumulates bytes across read() calls.
    let mut recv_buf: Vec<u8> = Vec::with_capacity(4096);
    let mut read_tmp = vec![0u8; 4096];

    loop {
        let n = match stream.read(&mut read_tmp).await {
            Ok(0) => {
                // EOF — the shell closed the connection.
                debug!("sync connection closed");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("sync read failed: {e}");
                break;
            }
        };
        recv_buf.extend_from_slice(&read_tmp[..n]);

        // A single read may have delivered multiple complete messages.
        loop {
            match decode_message(&recv_buf) {
                Ok((message, consumed)) => {
                    recv_buf.drain(..consumed);
                    dispatch(message, &store);
                }
                Err(ProtocolError::InsufficientData { .. }) => {
                    // Normal — not a full message yet; wait for more bytes.
                    break;
                }
                Err(e) => {
                    // Corrupt input; the connection is unsalvageable.
                    warn!("sync decode error: {e}");
                    return;
                }
            }
        }
    }
}

fn dispatch(message: PeerMessage, store: &ConfigStore) {
    match message {
        PeerMessage::Hello(hello) => {
            info!(
                "sync peer identified: {} ({}, protocol v{})",
                hello.peer_name, hello.peer_id, hello.protocol_version
            );
        }
        PeerMessage::ConfigSync(sync) => {
            store.apply_remote_update(sync.document, sync.change);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
