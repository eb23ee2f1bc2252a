//! Session storage capability consumed by the cart.

use std::collections::HashMap;

use serde_json::Value;

/// Key/value storage for one visitor's session.
///
/// The cart never persists anything itself. It reads and writes one value
/// through this trait and calls [`SessionStore::mark_modified`] after every
/// change; flushing the session to durable storage is the implementor's job.
///
/// `set` and `remove` do not imply modification.
pub trait SessionStore {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value);

    /// Remove the value under `key`, returning it if present.
    fn remove(&mut self, key: &str) -> Option<Value>;

    /// Flag the session as changed so the owner writes it back.
    fn mark_modified(&mut self);
}

/// In-memory [`SessionStore`].
///
/// Used as the request-scoped snapshot of a visitor's session, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<String, Value>,
    modified: bool,
}

impl MemorySession {
    /// Create an empty, unmodified session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unmodified session holding a single value.
    #[must_use]
    pub fn with_value(key: &str, value: Value) -> Self {
        let mut session = Self::new();
        session.set(key, value);
        session
    }

    /// Whether anything marked this session as modified.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    fn mark_modified(&mut self) {
        self.modified = true;
    }
}
