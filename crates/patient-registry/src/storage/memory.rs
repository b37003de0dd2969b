//! In-memory slot store.

use std::collections::HashMap;

use super::{check_quota, slot_bytes, SlotStore};
use crate::error::Result;

/// Slot store backed by a `HashMap`. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of all slots. `None` removes the limit.
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Change the quota of an existing store.
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Number of slots stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn bytes_excluding(&self, key: &str) -> usize {
        self.slots
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| slot_bytes(k, v))
            .sum()
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.bytes_excluding(key), self.quota)?;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.slots.remove(key).is_some())
    }
}
