//! JSON storage handles

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

use medinexus_storage::{entry_size, KeyValueStore};

use crate::error::KvError;
use crate::namespace::Namespace;
use crate::Result;

/// Called with every error swallowed by a fail-silent method.
pub type ErrorHook = Arc<dyn Fn(&KvError) + Send + Sync>;

/// A view over a [`KeyValueStore`], either the whole store or one namespace.
///
/// Handles hold no state beyond the store reference and the namespace, so
/// any number of them may point at the same namespace.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn KeyValueStore>,
    namespace: Option<Namespace>,
    on_error: Option<ErrorHook>,
}

impl Storage {
    /// Un-namespaced view: keys are used as-is.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            namespace: None,
            on_error: None,
        }
    }

    pub fn namespaced(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: Some(Namespace::new(namespace)),
            on_error: None,
        }
    }

    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Same store and hook, different namespace.
    pub fn scoped(&self, namespace: impl Into<String>) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: Some(Namespace::new(namespace)),
            on_error: self.on_error.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        crate::is_available(self.store.as_ref())
    }

    // Fail-silent API

    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set_item(key, value) {
            self.report("set", key, e);
        }
    }

    /// Stored value for `key`, or `default` when it is absent, unreadable, or
    /// does not decode as `T`.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get_item(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                self.report("get", key, e);
                default
            }
        }
    }

    /// Like [`get_item`](Self::get_item), but `default` is also returned when
    /// `validate` rejects the decoded value.
    pub fn get_item_with<T, F>(&self, key: &str, default: T, validate: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> bool,
    {
        match self.try_get_item::<T>(key) {
            Ok(Some(value)) => {
                if validate(&value) {
                    value
                } else {
                    self.report("get", key, KvError::Rejected(key.to_string()));
                    default
                }
            }
            Ok(None) => default,
            Err(e) => {
                self.report("get", key, e);
                default
            }
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Err(e) = self.try_remove_item(key) {
            self.report("remove", key, e);
        }
    }

    /// Namespaced: removes this namespace's keys only. Un-namespaced: empties
    /// the store.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            self.report("clear", "", e);
        }
    }

    /// True when a raw value exists for `key`; an empty string counts.
    pub fn has_key(&self, key: &str) -> bool {
        match self.try_has_key(key) {
            Ok(present) => present,
            Err(e) => {
                self.report("has_key", key, e);
                false
            }
        }
    }

    /// Logical keys in store enumeration order.
    pub fn get_all_keys(&self) -> Vec<String> {
        match self.try_get_all_keys() {
            Ok(keys) => keys,
            Err(e) => {
                self.report("get_all_keys", "", e);
                Vec::new()
            }
        }
    }

    /// Approximate bytes used, at two bytes per UTF-16 code unit of physical
    /// key and stored value. An estimate, not the store's real footprint.
    pub fn get_used_space(&self) -> usize {
        match self.try_get_used_space() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.report("get_used_space", "", e);
                0
            }
        }
    }

    // Fallible API

    pub fn try_set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set_item(&self.physical(key), &raw)?;
        Ok(())
    }

    /// `Ok(None)` when the key is absent.
    pub fn try_get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get_item(&self.physical(key))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn try_remove_item(&self, key: &str) -> Result<()> {
        self.store.remove_item(&self.physical(key))?;
        Ok(())
    }

    /// Returns the number of keys removed.
    pub fn try_clear(&self) -> Result<usize> {
        let Some(ns) = &self.namespace else {
            let count = self.store.len()?;
            self.store.clear()?;
            return Ok(count);
        };

        // Scans every key in the store, not just this namespace's
        let owned: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|k| ns.contains(k))
            .collect();

        for key in &owned {
            self.store.remove_item(key)?;
        }

        tracing::debug!(namespace = %ns, removed = owned.len(), "Cleared namespace");
        Ok(owned.len())
    }

    pub fn try_has_key(&self, key: &str) -> Result<bool> {
        Ok(self.store.get_item(&self.physical(key))?.is_some())
    }

    pub fn try_get_all_keys(&self) -> Result<Vec<String>> {
        let keys = self.store.keys()?;
        Ok(match &self.namespace {
            Some(ns) => keys
                .iter()
                .filter_map(|k| ns.decode(k))
                .map(str::to_string)
                .collect(),
            None => keys,
        })
    }

    pub fn try_get_used_space(&self) -> Result<usize> {
        let mut total = 0;
        for physical in self.physical_keys()? {
            // A key removed between listing and reading contributes nothing
            if let Some(value) = self.store.get_item(&physical)? {
                total += entry_size(&physical, &value);
            }
        }
        Ok(total)
    }

    fn physical<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.namespace {
            Some(ns) => Cow::Owned(ns.encode(key)),
            None => Cow::Borrowed(key),
        }
    }

    fn physical_keys(&self) -> Result<Vec<String>> {
        let keys = self.store.keys()?;
        Ok(match &self.namespace {
            Some(ns) => keys.into_iter().filter(|k| ns.contains(k)).collect(),
            None => keys,
        })
    }

    fn report(&self, op: &str, key: &str, error: KvError) {
        let namespace = self.namespace.as_ref().map(Namespace::name).unwrap_or("");
        tracing::warn!(op, namespace, key, error = %error, "Storage operation failed");
        if let Some(hook) = &self.on_error {
            hook(&error);
        }
    }
}
