//! Quill shell — the UI-capable process.
//!
//! The shell hosts the editor, renderer, and dialog surfaces. It keeps its
//! own copy of the configuration document and persists its commits itself,
//! but every committed change is also relayed to the vault so the storage
//! side observes the same state. The channel is one-directional; the vault
//! never pushes configuration back.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ TcpSyncRelay::connect        -- loopback connection to the vault
//!  └─ ConfigStore::open(Secondary) -- reads settings.json, or starts empty
//!  └─ ServiceRegistry (Secondary)  -- editor, renderer, alerter, dialog
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
use quill_shell::infrastructure::vault_conn::TcpSyncRelay;

/// Default TCP port of the vault's sync channel.
const DEFAULT_VAULT_PORT: u16 = 27183;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Quill UI shell.
///
/// Connects to a running Quill vault and relays every committed
/// configuration change to it over the loopback sync channel.
#[derive(Debug, Parser)]
#[command(
    name = "quill-shell",
    about = "Quill UI shell — editor host and configuration relay",
    version
)]
struct Cli {
    /// Hostname or IP address of the vault.
    #[arg(long, default_value = "127.0.0.1", env = "QUILL_VAULT_HOST")]
    vault_host: String,

    /// TCP port of the vault's sync channel.
    #[arg(long, default_value_t = DEFAULT_VAULT_PORT, env = "QUILL_VAULT_PORT")]
    vault_port: u16,

    /// Path of the settings file, overriding the per-user default.
    #[arg(long, env = "QUILL_CONFIG_FILE")]
    config_file: Option<PathBuf>,
}

impl Cli {
    /// Resolves the vault's sync channel address.
    ///
    /// # Errors
    ///
    /// Returns an error if `--vault-host` is not a valid IP address.
    fn vault_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.vault_host, self.vault_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid vault address: '{}:{}'",
                    self.vault_host, self.vault_port
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
    let vault_addr = cli.vault_addr()?;
    let adapter = cli.adapter()?;

    info!(
        "Quill shell starting — config at {}",
        adapter.path().display()
    );

    // The shell is useless without its vault; fail fast with context rather
    // than limping along with an unsynchronized store.
    let relay = TcpSyncRelay::connect(vault_addr)
        .await
        .context("is the Quill vault running?")?;

    let store = Arc::new(ConfigStore::open(
        ProcessRole::Secondary,
        Arc::new(adapter),
        Some(Arc::new(relay)),
    ));
    let registry = ServiceRegistry::new(ProcessRole::Secondary, Arc::clone(&store));

    store.subscribe(|event| match event {
        ConfigEvent::Changed(change) => info!("config changed: {}", change.path),
        ConfigEvent::ChangeFailed { path } => warn!("config change failed: {path}"),
    });

    let editor = registry.editor();
    info!("editor ready (keybinding: {})", editor.keybinding());
    let _renderer = registry.note_renderer();
    let _dialog = registry.dialog();

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("Quill shell ready.  Press Ctrl-C to exit.");

    // The full build opens the window shell here; the headless variant
    // blocks until the shutdown flag is cleared.
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    info!("Quill shell stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_produce_correct_vault_port() {
        let cli = Cli::parse_from(["quill-shell"]);
        assert_eq!(cli.vault_port, DEFAULT_VAULT_PORT);
    }

    #[test]
    fn test_cli_defaults_produce_loopback_vault_host() {
        let cli = Cli::parse_from(["quill-shell"]);
        assert_eq!(cli.vault_host, "127.0.0.1");
    }

    #[test]
    fn test_cli_vault_port_override() {
        let cli = Cli::parse_from(["quill-shell", "--vault-port", "9876"]);
        assert_eq!(cli.vault_port, 9876);
    }

    #[test]
    fn test_cli_vault_host_override() {
        let cli = Cli::parse_from(["quill-shell", "--vault-host", "10.0.0.5"]);
        assert_eq!(cli.vault_host, "10.0.0.5");
    }

    #[test]
    fn test_vault_addr_combines_host_and_port() {
        let cli = Cli::parse_from(["quill-shell", "--vault-host", "127.0.0.1", "--vault-port", "9000"]);
        let addr = cli.vault_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_vault_addr_rejects_invalid_host() {
        let cli = Cli {
            vault_host: "not.an.ip".to_string(),
            vault_port: DEFAULT_VAULT_PORT,
            config_file: None,
        };
        assert!(cli.vault_addr().is_err());
    }

    #[test]
    fn test_adapter_uses_config_file_override() {
        let cli = Cli {
            vault_host: "127.0.0.1".to_string(),
            vault_port: DEFAULT_VAULT_PORT,
            config_file: Some(PathBuf::from("/tmp/override.json")),
        };
        let adapter = cli.adapter().unwrap();
        assert_eq!(adapter.path(), std::path::Path::new("/tmp/override.json"));
    }
}
