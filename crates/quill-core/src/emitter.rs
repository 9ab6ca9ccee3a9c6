//! Synchronous, ordered publish/subscribe channel for configuration events.
//!
//! The emitter carries exactly two event kinds: `Changed` (a field was
//! committed) and `ChangeFailed` (persistence failed and the field was
//! rolled back). Listeners run synchronously on the task that committed the
//! change, in registration order.
//!
//! # Reentrancy
//!
//! The listener list is snapshotted under the lock and delivery happens with
//! the lock released, so a listener may subscribe, unsubscribe, or trigger
//! another commit during delivery without deadlocking. Listeners added
//! during a delivery see only subsequent events; a panicking listener
//! unwinds out of `emit` but leaves the listener list intact for later
//! deliveries.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::domain::change::ChangeRecord;

/// A configuration change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEvent {
    /// A field was committed successfully (locally or via a remote update).
    Changed(ChangeRecord),
    /// Persistence failed for a field; its in-memory value has been rolled
    /// back to the prior value.
    ChangeFailed { path: String },
}

/// Handle returned by [`ChangeEmitter::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ConfigEvent) + Send + Sync>;

#[derive(Default)]
struct EmitterInner {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Ordered synchronous notification channel.
#[derive(Default)]
pub struct ChangeEmitter {
    inner: Mutex<EmitterInner>,
}

impl ChangeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its id. Listeners fire in
    /// registration order.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ConfigEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when the id was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(listener_id, _)| *listener_id != id);
        inner.listeners.len() != before
    }

    /// Delivers `event` to every registered listener, in registration order.
    pub fn emit(&self, event: &ConfigEvent) {
        trace!(?event, "delivering config event");
        let snapshot: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EmitterInner> {
        // A panic inside a listener never happens while this lock is held,
        // but recover from poisoning anyway so one bad subscriber cannot
        // take the channel down for the rest of the process.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
