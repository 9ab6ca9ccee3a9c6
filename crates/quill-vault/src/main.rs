//! Quill vault — the storage-owning process.
//!
//! The vault owns the durable configuration document, the note repository,
//! and the version-control subsystem. The UI shell runs as a separate
//! process and relays every configuration change here over the loopback
//! sync channel; the vault replaces its document wholesale and notifies its
//! own subsystems through the store's change events.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ ConfigStore::open(Primary)   -- reads settings.json, or starts empty
//!  └─ ServiceRegistry (Primary)    -- note manager, dialog, git (gated)
//!  └─ SyncListener::run            -- accept loop on the sync port,
//!                                     feeding apply_remote_update
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quill_app::{ConfigStore, JsonFileAdapter, ProcessRole, ServiceRegistry};
use quill_core::ConfigEvent;
use quill_vault::infrastructure::sync_listener::{SyncListener, DEFAULT_SYNC_PORT};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Quill storage daemon.
///
/// Owns the persisted configuration document and accepts configuration
/// updates relayed by the Quill shell over the loopback sync channel.
#[derive(Debug, Parser)]
#[command(
    name = "quill-vault",
    about = "Quill storage daemon — configuration owner and sync endpoint",
    version
)]
struct Cli {
    /// TCP port for the configuration sync channel.
    #[arg(long, default_value_t = DEFAULT_SYNC_PORT, env = "QUILL_SYNC_PORT")]
    sync_port: u16,

    /// IP address to bind the sync channel to.
    ///
    /// The channel carries unauthenticated configuration snapshots, so it
    /// stays on loopback; there is no reason to expose it on a LAN.
    #[arg(long, default_value = "127.0.0.1", env = "QUILL_SYNC_BIND")]
    sync_bind: String,

    /// Path of the settings file, overriding the per-user default.
    #[arg(long, env = "QUILL_CONFIG_FILE")]
    config_file: Option<PathBuf>,
}

impl Cli {
    /// Resolves the sync channel bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `--sync-bind` is not a valid IP address.
    fn sync_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.sync_bind, self.sync_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid sync bind address: '{}:{}'",
                    self.sync_bind, self.sync_port
                )
            })
    }

    /// Builds the persistence adapter for the configured settings path.
    fn adapter(&self) -> anyhow::Result<JsonFileAdapter> {
        Ok(match &self.config_file {
            Some(path) => JsonFileAdapter::new(path),
            None => JsonFileAdapter::at_default_path()?,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging. Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let sync_addr = cli.sync_addr()?;
    let adapter = cli.adapter()?;

    info!(
        "Quill vault starting — config at {}",
        adapter.path().display()
    );

    let store = Arc::new(ConfigStore::open(
        ProcessRole::Primary,
        Arc::new(adapter),
        None,
    ));
    let registry = ServiceRegistry::new(ProcessRole::Primary, Arc::clone(&store));

    // The vault's subsystems observe remote updates the same way they
    // observe local commits: through the store's change events.
    store.subscribe(|event| match event {
        ConfigEvent::Changed(change) => info!("config changed: {}", change.path),
        ConfigEvent::ChangeFailed { path } => warn!("config change failed: {path}"),
    });

    let note_manager = registry.note_manager();
    if note_manager.note_dir().is_empty() {
        info!("no note directory configured yet");
    }
    match registry.git() {
        Ok(git) => info!("git subsystem ready for {}", git.note_dir()),
        Err(e) => info!("git subsystem deferred: {e}"),
    }

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Sync channel ──────────────────────────────────────────────────────────
    let listener = SyncListener::bind(sync_addr).await?;
    info!("Quill vault ready — sync channel on {sync_addr}");
    listener.run(store, running).await;

    info!("Quill vault stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
