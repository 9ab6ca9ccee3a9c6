//! Namespaced views over slices of the root document.
//!
//! A view carries only its namespace prefix and a handle to the owning
//! root; every read and write goes through the root with the prefix
//! prepended to the dotted path. Nothing here persists, broadcasts, or
//! rolls back — that is the root's job alone.

use serde_json::Value;

use quill_core::RemoteAuth;

use super::ConfigStore;

fn scoped(namespace: &str, field: &str) -> String {
    format!("{namespace}.{field}")
}

// ── Editor settings ───────────────────────────────────────────────────────────

/// The `editor.*` namespace.
#[derive(Clone)]
pub struct EditorSettings {
    root: ConfigStore,
}

impl EditorSettings {
    const NAMESPACE: &'static str = "editor";

    pub(crate) fn new(root: ConfigStore) -> Self {
        Self { root }
    }

    /// Keybinding profile; defaults to `"default"`.
    pub fn keybinding(&self) -> String {
        self.root
            .get(&scoped(Self::NAMESPACE, "keybinding"))
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "default".to_string())
    }

    pub async fn set_keybinding(&self, keybinding: &str) {
        self.root
            .set(
                &scoped(Self::NAMESPACE, "keybinding"),
                Value::String(keybinding.to_string()),
            )
            .await;
    }
}

// ── Git settings ──────────────────────────────────────────────────────────────

/// The `git.*` namespace: commit identity, remote URL, and the credential
/// descriptor.
#[derive(Clone)]
pub struct GitSettings {
    root: ConfigStore,
}

impl GitSettings {
    const NAMESPACE: &'static str = "git";

    pub(crate) fn new(root: ConfigStore) -> Self {
        Self { root }
    }

    fn get_string(&self, field: &str) -> String {
        self.root
            .get(&scoped(Self::NAMESPACE, field))
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    async fn set_string(&self, field: &str, value: &str) {
        self.root
            .set(
                &scoped(Self::NAMESPACE, field),
                Value::String(value.to_string()),
            )
            .await;
    }

    pub fn username(&self) -> String {
        self.get_string("username")
    }

    pub async fn set_username(&self, username: &str) {
        self.set_string("username", username).await;
    }

    pub fn user_email(&self) -> String {
        self.get_string("userEmail")
    }

    pub async fn set_user_email(&self, email: &str) {
        self.set_string("userEmail", email).await;
    }

    pub fn remote(&self) -> String {
        self.get_string("remote")
    }

    pub async fn set_remote(&self, url: &str) {
        self.set_string("remote", url).await;
    }

    /// The stored credential descriptor, if one is present and well-formed.
    pub fn remote_auth(&self) -> Option<RemoteAuth> {
        self.root
            .get(&scoped(Self::NAMESPACE, "remote-auth"))
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Stores a credential descriptor. Change detection is structural: a
    /// descriptor identical in variant and every variant-specific field to
    /// the stored one is a no-op.
    pub async fn set_remote_auth(&self, auth: RemoteAuth) {
        // Serializing a plain tagged enum of strings cannot fail.
        let value = serde_json::to_value(&auth).unwrap_or(Value::Null);
        self.root
            .set_with(
                &scoped(Self::NAMESPACE, "remote-auth"),
                value,
                RemoteAuth::value_changed,
            )
            .await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessRole;
    use crate::test_support::{capture_events, MemoryAdapter};
    use quill_core::{ChangeRecord, ConfigEvent};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> ConfigStore {
        ConfigStore::open(ProcessRole::Primary, MemoryAdapter::empty(), None)
    }

    fn ssh(public_key: &str, private_key: &str) -> RemoteAuth {
        RemoteAuth::Ssh {
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        }
    }

    fn password(username: &str, password: &str) -> RemoteAuth {
        RemoteAuth::Password {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_keybinding_defaults_to_default() {
        assert_eq!(store().editor().keybinding(), "default");
    }

    #[tokio::test]
    async fn test_set_keybinding_updates_root_document_under_dotted_path() {
        let store = store();
        let events = capture_events(&store);

        store.editor().set_keybinding("vim").await;

        // The namespace prefix lands in both the document and the event path.
        assert_eq!(store.get("editor.keybinding"), Some(json!("vim")));
        assert_eq!(store.editor().keybinding(), "vim");
        assert_eq!(
            *events.lock().unwrap(),
            vec![ConfigEvent::Changed(ChangeRecord::new(
                "editor.keybinding",
                json!("vim"),
                None
            ))]
        );
    }

    #[tokio::test]
    async fn test_git_string_fields_round_trip() {
        let store = store();
        let git = store.git();

        git.set_username("user").await;
        git.set_user_email("user@example.com").await;
        git.set_remote("git@example.com:notes.git").await;

        assert_eq!(git.username(), "user");
        assert_eq!(git.user_email(), "user@example.com");
        assert_eq!(git.remote(), "git@example.com:notes.git");
        assert_eq!(store.get("git.userEmail"), Some(json!("user@example.com")));
    }

    #[tokio::test]
    async fn test_setting_identical_ssh_auth_is_a_no_op() {
        let adapter = MemoryAdapter::empty();
        let store = ConfigStore::open(ProcessRole::Primary, adapter.clone(), None);
        let git = store.git();

        git.set_remote_auth(ssh("pub", "priv")).await;
        let events = capture_events(&store);

        git.set_remote_auth(ssh("pub", "priv")).await;

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(adapter.write_count(), 1);
    }

    #[tokio::test]
    async fn test_password_auth_with_different_password_is_one_change() {
        let store = store();
        let git = store.git();

        git.set_remote_auth(password("user", "secret")).await;
        let events = capture_events(&store);

        git.set_remote_auth(password("user", "rotated")).await;

        assert_eq!(events.lock().unwrap().len(), 1);
        assert_eq!(git.remote_auth(), Some(password("user", "rotated")));
    }

    #[tokio::test]
    async fn test_variant_change_commits() {
        let store = store();
        let git = store.git();

        git.set_remote_auth(ssh("pub", "priv")).await;
        let events = capture_events(&store);

        git.set_remote_auth(password("user", "secret")).await;

        assert_eq!(events.lock().unwrap().len(), 1);
        assert_eq!(git.remote_auth(), Some(password("user", "secret")));
    }

    #[tokio::test]
    async fn test_first_auth_write_commits() {
        let store = store();
        let events = capture_events(&store);

        store.git().set_remote_auth(ssh("pub", "priv")).await;

        assert_eq!(events.lock().unwrap().len(), 1);
        assert_eq!(
            store.get("git.remote-auth"),
            Some(json!({"type": "ssh", "publicKey": "pub", "privateKey": "priv"}))
        );
    }

    #[test]
    fn test_remote_auth_absent_returns_none() {
        assert_eq!(store().git().remote_auth(), None);
    }
}
