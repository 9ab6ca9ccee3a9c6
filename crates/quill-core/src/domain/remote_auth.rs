//! The git remote credential descriptor and its structural comparator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials used to reach the configured note-repository remote.
///
/// Stored in the document under `git.remote-auth` as a tagged object:
/// `{"type": "ssh", "publicKey": …, "privateKey": …}` or
/// `{"type": "password", "username": …, "password": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteAuth {
    #[serde(rename_all = "camelCase")]
    Ssh {
        public_key: String,
        private_key: String,
    },
    Password { username: String, password: String },
}

impl RemoteAuth {
    /// Structural change predicate over raw document values, used as the
    /// comparator for the `git.remote-auth` field.
    ///
    /// Writing a descriptor is a no-op only when one is already stored, the
    /// variants match, and every variant-specific field is pairwise equal.
    /// Anything else (no prior descriptor, a variant change, a differing
    /// sub-field, an unparseable stored value) counts as a change.
    pub fn value_changed(old: Option<&Value>, new: &Value) -> bool {
        let old_auth = old.and_then(|value| serde_json::from_value::<Self>(value.clone()).ok());
        let new_auth = serde_json::from_value::<Self>(new.clone()).ok();
        match (old_auth, new_auth) {
            (Some(old_auth), Some(new_auth)) => old_auth != new_auth,
            _ => true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
