//! In-memory persistence and event-capture helpers shared by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quill_core::{ConfigEvent, Document};

use crate::persistence::{PersistError, PersistenceAdapter};
use crate::store::ConfigStore;

/// Adapter that records writes and can be switched into a failing mode.
pub(crate) struct MemoryAdapter {
    initial: Option<Document>,
    written: Mutex<Vec<Document>>,
    fail_writes: AtomicBool,
}

impl MemoryAdapter {
    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(Self {
            initial: None,
            written: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_document(document: Document) -> Arc<Self> {
        Arc::new(Self {
            initial: Some(document),
            written: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn write_count(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    pub(crate) fn last_written(&self) -> Option<Document> {
        self.written.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    fn read_document(&self) -> Option<Document> {
        self.initial.clone()
    }

    async fn write_document(&self, document: &Document) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Io {
                path: "<memory>".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "writes disabled"),
            });
        }
        self.written.lock().unwrap().push(document.clone());
        Ok(())
    }
}

/// Subscribes a collector to the store and returns the shared event list.
pub(crate) fn capture_events(store: &ConfigStore) -> Arc<Mutex<Vec<ConfigEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}
