//! The nested configuration document and its dotted-path addressing.
//!
//! A [`Document`] is a single JSON object mapping: keys are strings, values
//! are primitives, nested mappings, or structured records (for example the
//! git credential descriptor). Exactly one instance is live per process; the
//! namespaced settings views never copy it, they address slices of it
//! through the owning store with a namespace prefix.
//!
//! Fields are addressed by *dotted paths*: `git.remote` names the `remote`
//! key inside the `git` sub-mapping. Path segments correspond exactly to the
//! chain of namespace prefixes concatenated with the leaf field name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole configuration document of one process.
///
/// Serialization is transparent: a `Document` reads and writes as a plain
/// JSON object, which is also exactly what travels in a sync message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a parsed JSON value, returning `None` when the top level is not
    /// an object. Callers use this to treat malformed input as "no document"
    /// rather than an error.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the value at `path`, splitting on `.` and descending through
    /// nested objects. Returns `None` when any segment is missing or when an
    /// intermediate segment is not an object.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Writes `value` at `path`, returning the previous value if one was
    /// present.
    ///
    /// All but the last segment name the containing mapping; missing
    /// intermediate objects are created, and a non-object intermediate is
    /// replaced by an empty object so the leaf always has a home. An empty
    /// path is ignored.
    pub fn set(&mut self, path: &str, value: Value) -> Option<Value> {
        let (container, leaf) = self.containing_map_mut(path)?;
        container.insert(leaf.to_string(), value)
    }

    /// Removes the value at `path`, returning it if it was present.
    ///
    /// Used by rollback when the failed commit introduced a previously
    /// absent field.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (container, leaf) = self.containing_map_mut(path)?;
        container.remove(leaf)
    }

    /// Ensures a top-level key holds an object, replacing any non-object
    /// value. Called after every wholesale replacement so the `editor` and
    /// `git` namespaces always exist.
    pub fn ensure_section(&mut self, name: &str) {
        let slot = self
            .0
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
    }

    /// Returns `true` when the document has no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Walks all but the last path segment, creating intermediate objects as
    /// needed, and returns the containing mapping together with the leaf
    /// segment. Returns `None` for an empty path.
    fn containing_map_mut<'doc, 'path>(
        &'doc mut self,
        path: &'path str,
    ) -> Option<(&'doc mut Map<String, Value>, &'path str)> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop()?;
        if leaf.is_empty() && segments.is_empty() {
            return None;
        }

        let mut current = &mut self.0;
        for segment in segments {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just ensured to be an object"),
            };
        }
        Some((current, leaf))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
