//! Collaborator facades handed out by the service registry.
//!
//! Everything here sits outside the configuration core proper. The facades
//! consume the store exclusively through its namespaced accessors and event
//! subscription; none of them touch the document directly. The full
//! subsystems behind them (the editor widget, the markdown pipeline, the
//! git plumbing) live with their host binaries.

use std::path::PathBuf;

use tracing::warn;

use crate::store::{EditorSettings, GitSettings};

/// The text editor subsystem of the UI shell.
pub struct Editor {
    settings: EditorSettings,
}

impl Editor {
    pub(crate) fn new(settings: EditorSettings) -> Self {
        Self { settings }
    }

    /// The active keybinding profile, read through the `editor.*` view.
    pub fn keybinding(&self) -> String {
        self.settings.keybinding()
    }
}

/// Note storage bookkeeping shared by both roles.
pub struct NoteManager {
    note_dir: String,
}

impl NoteManager {
    pub(crate) fn new(note_dir: String) -> Self {
        Self { note_dir }
    }

    /// Empty until the user configures a note directory.
    pub fn note_dir(&self) -> &str {
        &self.note_dir
    }

    /// Resolves a note title to its on-disk path.
    pub fn note_path(&self, title: &str) -> PathBuf {
        PathBuf::from(&self.note_dir).join(format!("{title}.md"))
    }
}

/// Markdown rendering for the UI shell.
pub struct NoteRenderer;

impl NoteRenderer {
    pub(crate) fn new() -> Self {
        Self
    }
}

/// User-visible alert surface of the UI shell.
pub struct Alerter;

impl Alerter {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Surfaces a warning to the user. The shell wires this to its window
    /// layer; headless builds fall back to the log.
    pub fn alert(&self, message: &str) {
        warn!("alert: {message}");
    }
}

/// Modal dialog surface, available in both roles.
pub struct Dialog;

impl Dialog {
    pub(crate) fn new() -> Self {
        Self
    }
}

/// Version control over the note repository. Storage-owning role only;
/// constructed against the note directory and the `git.*` view.
pub struct Git {
    note_dir: String,
    settings: GitSettings,
}

impl Git {
    pub(crate) fn new(note_dir: String, settings: GitSettings) -> Self {
        Self { note_dir, settings }
    }

    pub fn note_dir(&self) -> &str {
        &self.note_dir
    }

    /// The configured remote URL, read through the `git.*` view.
    pub fn remote(&self) -> String {
        self.settings.remote()
    }

    /// Commit identity as `(name, email)`.
    pub fn identity(&self) -> (String, String) {
        (self.settings.username(), self.settings.user_email())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessRole;
    use crate::store::ConfigStore;
    use crate::test_support::MemoryAdapter;

    fn store() -> ConfigStore {
        ConfigStore::open(ProcessRole::Primary, MemoryAdapter::empty(), None)
    }

    #[test]
    fn test_note_manager_resolves_note_paths() {
        let manager = NoteManager::new("/notes".to_string());
        assert_eq!(manager.note_path("todo"), PathBuf::from("/notes/todo.md"));
    }

    #[tokio::test]
    async fn test_git_reads_settings_through_the_view() {
        let store = store();
        store.git().set_remote("git@example.com:notes.git").await;
        store.git().set_username("user").await;
        store.git().set_user_email("user@example.com").await;

        let git = Git::new("/notes".to_string(), store.git());
        assert_eq!(git.remote(), "git@example.com:notes.git");
        assert_eq!(
            git.identity(),
            ("user".to_string(), "user@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_editor_sees_later_keybinding_changes() {
        let store = store();
        let editor = Editor::new(store.editor());
        assert_eq!(editor.keybinding(), "default");

        store.editor().set_keybinding("vim").await;

        // The facade holds a view, not a cached value.
        assert_eq!(editor.keybinding(), "vim");
    }
}
