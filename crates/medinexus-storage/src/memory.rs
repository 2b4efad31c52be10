//! In-memory store
//!
//! Models the browser's origin-scoped store: insertion-ordered keys and an
//! optional byte quota. Also the fake used by tests throughout the workspace.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::StorageError;
use crate::store::{entry_size, KeyValueStore};
use crate::Result;

#[derive(Default)]
struct Inner {
    /// key -> (insertion sequence, value)
    entries: HashMap<String, (u64, String)>,
    next_seq: u64,
    used: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes which would take usage above `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            quota: Some(quota),
        }
    }

    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    /// Approximate bytes used by all entries.
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.read().entries.get(key).map(|(_, v)| v.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write();

        let previous = inner
            .entries
            .get(key)
            .map(|(_, old)| entry_size(key, old))
            .unwrap_or(0);
        let needed = inner.used - previous + entry_size(key, value);

        if let Some(quota) = self.quota {
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        let existing = inner.entries.get(key).map(|(seq, _)| *seq);
        let seq = match existing {
            Some(seq) => seq,
            None => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                seq
            }
        };
        inner.entries.insert(key.to_string(), (seq, value.to_string()));
        inner.used = needed;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some((_, old)) = inner.entries.remove(key) {
            inner.used -= entry_size(key, &old);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.used = 0;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut keyed: Vec<(u64, &String)> = inner
            .entries
            .iter()
            .map(|(k, (seq, _))| (*seq, k))
            .collect();
        keyed.sort_by_key(|(seq, _)| *seq);
        Ok(keyed.into_iter().map(|(_, k)| k.clone()).collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.inner.read().entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_contract() {
        let store = MemoryStore::new();
        assert_eq!(store.quota(), None);
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.get_item("missing").unwrap().is_none());

        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));

        // Overwrite keeps position and length
        store.set_item("a", "ONE").unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);

        store.remove_item("a").unwrap();
        store.remove_item("a").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b"]);

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_empty_value_is_present() {
        let store = MemoryStore::new();
        store.set_item("k", "").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_quota_rejects_and_leaves_store_unchanged() {
        // "k" + "12345" = 6 units = 12 bytes
        let store = MemoryStore::with_quota(12);
        assert_eq!(store.quota(), Some(12));
        store.set_item("k", "12345").unwrap();
        assert_eq!(store.used_bytes(), 12);

        let err = store.set_item("j", "1").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.get_item("j").unwrap().is_none());
        assert_eq!(store.used_bytes(), 12);

        // Shrinking an existing entry is fine
        store.set_item("k", "1").unwrap();
        assert_eq!(store.used_bytes(), 4);
        store.set_item("j", "1").unwrap();
        assert_eq!(store.used_bytes(), 8);
    }
}
