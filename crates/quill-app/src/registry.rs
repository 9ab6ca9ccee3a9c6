//! Process-wide service registry with role guards.
//!
//! The registry is an explicit application context, constructed once at
//! process start. It carries the process role tag and the already-opened
//! configuration store; every other subsystem is constructed on first
//! access and cached for the process lifetime.
//!
//! Two guard kinds exist. UI-capable services (editor, note renderer,
//! alerter) must never be touched from the storage-owning process, and the
//! version-control subsystem must never be touched from the UI process;
//! either violation is a programming defect and panics immediately rather
//! than degrading. The version-control accessor additionally requires a
//! configured note directory — a missing prerequisite is an error the
//! caller can satisfy and retry, not a defect.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::services::{Alerter, Dialog, Editor, Git, NoteManager, NoteRenderer};
use crate::store::ConfigStore;

/// Which of the two cooperating processes this context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Owns durable storage and accepts remote configuration updates
    /// (the vault daemon).
    Primary,
    /// UI-capable role; relays its configuration changes to the primary
    /// (the shell).
    Secondary,
}

/// Error type for registry accessors with prerequisites.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// The version-control subsystem needs `noteDir` configured first.
    #[error("cannot initialize git without a configured note directory")]
    NoteDirNotConfigured,
}

/// Lazily-constructed locator for the per-role subsystems.
pub struct ServiceRegistry {
    role: ProcessRole,
    config: Arc<ConfigStore>,
    editor: OnceLock<Arc<Editor>>,
    note_manager: OnceLock<Arc<NoteManager>>,
    note_renderer: OnceLock<Arc<NoteRenderer>>,
    alerter: OnceLock<Arc<Alerter>>,
    dialog: OnceLock<Arc<Dialog>>,
    git: OnceLock<Arc<Git>>,
}

impl ServiceRegistry {
    pub fn new(role: ProcessRole, config: Arc<ConfigStore>) -> Self {
        Self {
            role,
            config,
            editor: OnceLock::new(),
            note_manager: OnceLock::new(),
            note_renderer: OnceLock::new(),
            alerter: OnceLock::new(),
            dialog: OnceLock::new(),
            git: OnceLock::new(),
        }
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// The configuration store; available in both roles.
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// # Panics
    ///
    /// Panics when called from the storage-owning role.
    pub fn editor(&self) -> &Arc<Editor> {
        self.check_ui_role("editor");
        self.editor
            .get_or_init(|| Arc::new(Editor::new(self.config.editor())))
    }

    /// # Panics
    ///
    /// Panics when called from the storage-owning role.
    pub fn note_renderer(&self) -> &Arc<NoteRenderer> {
        self.check_ui_role("note renderer");
        self.note_renderer.get_or_init(|| Arc::new(NoteRenderer::new()))
    }

    /// # Panics
    ///
    /// Panics when called from the storage-owning role.
    pub fn alerter(&self) -> &Arc<Alerter> {
        self.check_ui_role("alerter");
        self.alerter.get_or_init(|| Arc::new(Alerter::new()))
    }

    /// Available in both roles.
    pub fn note_manager(&self) -> &Arc<NoteManager> {
        self.note_manager
            .get_or_init(|| Arc::new(NoteManager::new(self.config.note_dir())))
    }

    /// Available in both roles.
    pub fn dialog(&self) -> &Arc<Dialog> {
        self.dialog.get_or_init(|| Arc::new(Dialog::new()))
    }

    /// The version-control subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoteDirNotConfigured`] until a note
    /// directory has been configured; the caller supplies it and retries.
    ///
    /// # Panics
    ///
    /// Panics when called from the UI-capable role.
    pub fn git(&self) -> Result<&Arc<Git>, RegistryError> {
        self.check_storage_role("git");
        if let Some(git) = self.git.get() {
            return Ok(git);
        }

        let note_dir = self.config.note_dir();
        if note_dir.is_empty() {
            return Err(RegistryError::NoteDirNotConfigured);
        }
        Ok(self
            .git
            .get_or_init(|| Arc::new(Git::new(note_dir, self.config.git()))))
    }

    fn check_ui_role(&self, service: &str) {
        assert_eq!(
            self.role,
            ProcessRole::Secondary,
            "{service} is only available in the UI-capable role"
        );
    }

    fn check_storage_role(&self, service: &str) {
        assert_eq!(
            self.role,
            ProcessRole::Primary,
            "{service} is only available in the storage-owning role"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryAdapter;
    use quill_core::Document;
    use serde_json::json;

    fn registry(role: ProcessRole) -> ServiceRegistry {
        let store = Arc::new(ConfigStore::open(role, MemoryAdapter::empty(), None));
        ServiceRegistry::new(role, store)
    }

    fn registry_with_note_dir(role: ProcessRole) -> ServiceRegistry {
        let adapter = MemoryAdapter::with_document(
            Document::from_value(json!({"noteDir": "/notes"})).unwrap(),
        );
        let store = Arc::new(ConfigStore::open(role, adapter, None));
        ServiceRegistry::new(role, store)
    }

    #[test]
    fn test_config_is_available_in_both_roles() {
        assert_eq!(registry(ProcessRole::Primary).config().note_dir(), "");
        assert_eq!(registry(ProcessRole::Secondary).config().note_dir(), "");
    }

    #[test]
    fn test_editor_is_available_in_ui_role() {
        let registry = registry(ProcessRole::Secondary);
        assert_eq!(registry.editor().keybinding(), "default");
    }

    #[test]
    #[should_panic(expected = "only available in the UI-capable role")]
    fn test_editor_from_storage_role_panics() {
        registry(ProcessRole::Primary).editor();
    }

    #[test]
    #[should_panic(expected = "only available in the UI-capable role")]
    fn test_note_renderer_from_storage_role_panics() {
        registry(ProcessRole::Primary).note_renderer();
    }

    #[test]
    #[should_panic(expected = "only available in the UI-capable role")]
    fn test_alerter_from_storage_role_panics() {
        registry(ProcessRole::Primary).alerter();
    }

    #[test]
    #[should_panic(expected = "only available in the storage-owning role")]
    fn test_git_from_ui_role_panics() {
        let _ = registry_with_note_dir(ProcessRole::Secondary).git();
    }

    #[test]
    fn test_git_without_note_dir_returns_prerequisite_error() {
        let registry = registry(ProcessRole::Primary);
        assert_eq!(
            registry.git().err(),
            Some(RegistryError::NoteDirNotConfigured)
        );
    }

    #[test]
    fn test_git_with_note_dir_succeeds() {
        let registry = registry_with_note_dir(ProcessRole::Primary);
        let git = registry.git().expect("git must construct");
        assert_eq!(git.note_dir(), "/notes");
    }

    #[tokio::test]
    async fn test_git_succeeds_on_retry_after_note_dir_is_supplied() {
        let registry = registry(ProcessRole::Primary);
        assert!(registry.git().is_err());

        registry.config().set_note_dir("/notes").await;

        assert!(registry.git().is_ok());
    }

    #[test]
    fn test_git_is_cached_after_first_construction() {
        let registry = registry_with_note_dir(ProcessRole::Primary);
        let first = Arc::clone(registry.git().unwrap());
        let second = Arc::clone(registry.git().unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_note_manager_and_dialog_are_available_in_both_roles() {
        for role in [ProcessRole::Primary, ProcessRole::Secondary] {
            let registry = registry(role);
            let _ = registry.note_manager();
            let _ = registry.dialog();
        }
    }

    #[test]
    fn test_services_are_constructed_once() {
        let registry = registry(ProcessRole::Secondary);
        let first = Arc::clone(registry.editor());
        let second = Arc::clone(registry.editor());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
