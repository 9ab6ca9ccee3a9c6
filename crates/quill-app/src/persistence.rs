//! JSON file persistence for the configuration document.
//!
//! The document lives at the platform-appropriate per-user path:
//! - Windows:  `%APPDATA%\Quill\settings.json`
//! - Linux:    `~/.config/quill/settings.json`
//! - macOS:    `~/Library/Application Support/Quill/settings.json`
//!
//! Reading happens exactly once, at store construction, and must tolerate a
//! missing or corrupt file by signaling "no document" rather than erroring.
//! Writing replaces the whole document; it goes through a sibling temporary
//! file and a rename so a failed write never leaves a partially overwritten
//! document behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use quill_core::Document;

/// Error type for configuration persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized to JSON.
    #[error("failed to serialize config document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage for the configuration document.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Reads the stored document. Returns `None` for a missing or invalid
    /// file — loading never fails from the store's point of view.
    fn read_document(&self) -> Option<Document>;

    /// Persists the whole document. Must not partially overwrite the stored
    /// document on failure.
    async fn write_document(&self, document: &Document) -> Result<(), PersistError>;
}

// ── JSON file adapter ─────────────────────────────────────────────────────────

/// [`PersistenceAdapter`] backed by a single JSON file.
pub struct JsonFileAdapter {
    path: PathBuf,
}

impl JsonFileAdapter {
    /// Creates an adapter for an explicit file path. Used by tests and by
    /// the `--config-file` override.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates an adapter for the platform-default settings file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::NoPlatformConfigDir`] when the platform
    /// config base directory cannot be determined from the environment.
    pub fn at_default_path() -> Result<Self, PersistError> {
        Ok(Self::new(settings_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PersistenceAdapter for JsonFileAdapter {
    fn read_document(&self) -> Option<Document> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Document>(&raw) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(
                    "ignoring corrupt config file {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    async fn write_document(&self, document: &Document) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(document)?;

        // Ensure directory exists before writing.
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| PersistError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        // Write to a sibling temp file, then rename it over the target. The
        // rename is atomic on the same file system, so the previous document
        // stays intact if anything above fails.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|source| PersistError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| PersistError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the settings file.
///
/// # Errors
///
/// Returns [`PersistError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, PersistError> {
    platform_config_dir().ok_or(PersistError::NoPlatformConfigDir)
}

/// Resolves the full path to the settings file.
///
/// # Errors
///
/// Returns [`PersistError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn settings_file_path() -> Result<PathBuf, PersistError> {
    Ok(config_dir()?.join("settings.json"))
}

/// Resolves the platform config base directory including the app folder.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Quill"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("quill"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/Quill
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Quill")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
