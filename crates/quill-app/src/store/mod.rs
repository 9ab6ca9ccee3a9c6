//! The root configuration store.
//!
//! One [`ConfigStore`] is live per process. It owns the whole document,
//! hands out the namespaced settings views, and orchestrates the commit
//! pipeline: persist, then (secondary only) forward over the bridge, then
//! notify, with rollback of the written field when persistence fails.
//!
//! # Commit semantics
//!
//! Every successful `set` triggers its own persistence round trip and its
//! own bridge message; commits are never batched or coalesced. The document
//! mutation happens synchronously, before the first suspension point, so
//! the in-memory document always reflects call order even when two tasks'
//! persistence operations complete out of order — the on-disk document then
//! reflects whichever write completed last.
//!
//! Rollback restores only the field whose commit failed. It re-derives the
//! containing mapping from the dotted path, writes the old value back
//! without re-running comparators, and notifies nobody of the restored
//! value: a reader that cached the pre-failure value from a `Changed` event
//! stays stale until another change touches the same field. A second `set`
//! racing a failing commit on the same field can observe the transient
//! value between failure detection and rollback completion.

mod node;

pub use node::{EditorSettings, GitSettings};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{info, warn};

use quill_core::{
    ChangeEmitter, ChangeRecord, Comparator, ConfigEvent, ConfigSyncMessage, Document, ListenerId,
};

use crate::persistence::PersistenceAdapter;
use crate::registry::ProcessRole;
use crate::sync::SyncRelay;

struct StoreShared {
    role: ProcessRole,
    document: Mutex<Document>,
    emitter: ChangeEmitter,
    persistence: Arc<dyn PersistenceAdapter>,
    relay: Option<Arc<dyn SyncRelay>>,
}

/// Root of the hierarchical configuration store.
///
/// Cloning is cheap and shares the underlying document; the namespaced
/// views hand writes back to this root, which alone persists, forwards,
/// and rolls back.
#[derive(Clone)]
pub struct ConfigStore {
    shared: Arc<StoreShared>,
}

impl ConfigStore {
    /// Opens the store for the given role, reading the persisted document
    /// once. Missing or corrupt input degrades to an empty document — the
    /// caller never sees a load failure. The `editor` and `git` namespaces
    /// are ensured to exist.
    ///
    /// A secondary passes the relay that carries its commits to the
    /// primary; the primary passes `None`.
    pub fn open(
        role: ProcessRole,
        persistence: Arc<dyn PersistenceAdapter>,
        relay: Option<Arc<dyn SyncRelay>>,
    ) -> Self {
        let mut document = persistence.read_document().unwrap_or_default();
        document.ensure_section("editor");
        document.ensure_section("git");

        Self {
            shared: Arc::new(StoreShared {
                role,
                document: Mutex::new(document),
                emitter: ChangeEmitter::new(),
                persistence,
                relay,
            }),
        }
    }

    pub fn role(&self) -> ProcessRole {
        self.shared.role
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Registers a listener for `Changed` / `ChangeFailed` events. Listeners
    /// run synchronously on the committing task, in registration order.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ConfigEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.emitter.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.emitter.unsubscribe(id)
    }

    // ── Field access ──────────────────────────────────────────────────────────

    /// Returns the value at `path`, if present.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.lock_document().get(path).cloned()
    }

    /// Returns the value at `path`, or `default` when absent.
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Writes `value` at `path` if it differs structurally from the current
    /// value, then commits. Equal values produce no side effects: no
    /// persistence call, no bridge message, no event.
    pub async fn set(&self, path: &str, value: Value) {
        self.set_inner(path, value, None).await;
    }

    /// Like [`set`](Self::set), but change detection is delegated to
    /// `compare`, which receives the current value (or `None`) and the new
    /// value and returns whether the pair constitutes a real change.
    pub async fn set_with(&self, path: &str, value: Value, compare: Comparator) {
        self.set_inner(path, value, Some(compare)).await;
    }

    async fn set_inner(&self, path: &str, new_value: Value, compare: Option<Comparator>) {
        // Mutate in memory first, under the lock and before any suspension
        // point; the commit then runs against a snapshot.
        let (old_value, snapshot) = {
            let mut document = self.lock_document();
            let old_value = document.get(path).cloned();

            let changed = match compare {
                Some(compare) => compare(old_value.as_ref(), &new_value),
                None => old_value.as_ref() != Some(&new_value),
            };
            if !changed {
                return;
            }

            document.set(path, new_value.clone());
            (old_value, document.clone())
        };

        self.commit(ChangeRecord::new(path, new_value, old_value), snapshot)
            .await;
    }

    /// Persists the whole document and notifies. On success a secondary
    /// forwards the snapshot to the primary before emitting `Changed`; on
    /// failure the store emits `ChangeFailed` and then rolls the field back
    /// unconditionally.
    async fn commit(&self, record: ChangeRecord, snapshot: Document) {
        match self.shared.persistence.write_document(&snapshot).await {
            Ok(()) => {
                if self.shared.role == ProcessRole::Secondary {
                    if let Some(relay) = &self.shared.relay {
                        let message = ConfigSyncMessage {
                            document: snapshot,
                            change: record.clone(),
                        };
                        if let Err(e) = relay.forward(message).await {
                            // Best-effort channel: the primary misses this
                            // change until the next one lands.
                            warn!("failed to relay config change '{}': {e}", record.path);
                        }
                    }
                }
                self.shared.emitter.emit(&ConfigEvent::Changed(record));
            }
            Err(e) => {
                warn!("failed to persist config change '{}': {e}", record.path);
                self.shared.emitter.emit(&ConfigEvent::ChangeFailed {
                    path: record.path.clone(),
                });

                // Restore the old value. No comparator re-check, no Changed
                // emission for the restored value.
                let mut document = self.lock_document();
                match record.old_value {
                    Some(old_value) => {
                        document.set(&record.path, old_value);
                    }
                    None => {
                        document.remove(&record.path);
                    }
                }
            }
        }
    }

    // ── Remote updates ────────────────────────────────────────────────────────

    /// Replaces the entire document with a snapshot received from a
    /// secondary and re-emits the change to local subscribers. The primary
    /// does not persist here — the secondary already did before forwarding.
    ///
    /// # Panics
    ///
    /// Panics when called on a store running in the secondary role;
    /// accepting remote updates is a primary-role operation.
    pub fn apply_remote_update(&self, document: Document, change: ChangeRecord) {
        assert_eq!(
            self.shared.role,
            ProcessRole::Primary,
            "apply_remote_update is a primary-role operation"
        );

        info!("applying remote config change '{}'", change.path);
        {
            let mut current = self.lock_document();
            *current = document;
            current.ensure_section("editor");
            current.ensure_section("git");
        }
        self.shared.emitter.emit(&ConfigEvent::Changed(change));
    }

    // ── Top-level fields and namespaced views ─────────────────────────────────

    /// Directory holding the note repository. Empty until configured.
    pub fn note_dir(&self) -> String {
        self.get("noteDir")
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub async fn set_note_dir(&self, note_dir: &str) {
        self.set("noteDir", Value::String(note_dir.to_string()))
            .await;
    }

    /// Verbose-diagnostics flag; defaults to `false`.
    pub fn debug(&self) -> bool {
        self.get("debug")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub async fn set_debug(&self, debug: bool) {
        self.set("debug", Value::Bool(debug)).await;
    }

    /// The `editor.*` view.
    pub fn editor(&self) -> EditorSettings {
        EditorSettings::new(self.clone())
    }

    /// The `git.*` view.
    pub fn git(&self) -> GitSettings {
        GitSettings::new(self.clone())
    }

    fn lock_document(&self) -> MutexGuard<'_, Document> {
        // Never held across an await; recover from poisoning so a panicking
        // event listener elsewhere cannot wedge the document.
        self.shared
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
