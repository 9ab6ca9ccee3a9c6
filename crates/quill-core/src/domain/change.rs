//! Change records and per-field comparators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single committed (or attempted) field change: the unit of notification
/// and the unit of rollback addressing.
///
/// `path` is the dotted field path (`git.remote`), `old_value` is `None`
/// when the field had no prior value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub new_value: Value,
    pub old_value: Option<Value>,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, new_value: Value, old_value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            new_value,
            old_value,
        }
    }
}

/// Per-field change predicate: returns `true` when the old/new pair
/// constitutes a real change. A field without a comparator falls back to
/// structural equality on the JSON values.
///
/// `None` for the old value models a field that has never been written.
pub type Comparator = fn(Option<&Value>, &Value) -> bool;

// ── Tests ─────────────────────────────────────────────────────────────────────
