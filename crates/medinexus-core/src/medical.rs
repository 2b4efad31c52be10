//! Guarded application storage
//!
//! The store is probed once when [`MedicalStorage`] is built. When the probe
//! fails, every handle answers with defaults and never touches the store, so
//! callers need no per-call "is storage here?" checks.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use medinexus_kv::{is_available, ErrorHook, Storage};
use medinexus_storage::KeyValueStore;

use crate::config::Config;
use crate::Result;

pub struct MedicalStorage {
    store: Arc<dyn KeyValueStore>,
    available: bool,
    on_error: Option<ErrorHook>,
}

impl MedicalStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let available = is_available(store.as_ref());
        if available {
            tracing::info!("Storage available");
        } else {
            tracing::warn!("Storage unavailable, reads return defaults and writes are dropped");
        }

        Self {
            store,
            available,
            on_error: None,
        }
    }

    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(config.open_store()?))
    }

    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Handle scoped to `name`.
    pub fn namespace(&self, name: &str) -> GuardedStorage {
        GuardedStorage {
            inner: self.available.then(|| self.attach(Storage::namespaced(Arc::clone(&self.store), name))),
        }
    }

    /// Handle over the whole store, without a prefix.
    pub fn global(&self) -> GuardedStorage {
        GuardedStorage {
            inner: self.available.then(|| self.attach(Storage::new(Arc::clone(&self.store)))),
        }
    }

    /// Approximate bytes used across every namespace.
    pub fn used_space(&self) -> usize {
        self.global().get_used_space()
    }

    fn attach(&self, storage: Storage) -> Storage {
        match &self.on_error {
            Some(hook) => storage.with_error_hook(Arc::clone(hook)),
            None => storage,
        }
    }
}

/// A [`Storage`] that may be absent. Absent handles return defaults.
#[derive(Clone)]
pub struct GuardedStorage {
    inner: Option<Storage>,
}

impl GuardedStorage {
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Some(storage) = &self.inner {
            storage.set_item(key, value);
        }
    }

    pub fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match &self.inner {
            Some(storage) => storage.get_item(key, default),
            None => default,
        }
    }

    pub fn get_item_with<T, F>(&self, key: &str, default: T, validate: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> bool,
    {
        match &self.inner {
            Some(storage) => storage.get_item_with(key, default, validate),
            None => default,
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Some(storage) = &self.inner {
            storage.remove_item(key);
        }
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.inner {
            storage.clear();
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.inner.as_ref().is_some_and(|s| s.has_key(key))
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.inner
            .as_ref()
            .map(Storage::get_all_keys)
            .unwrap_or_default()
    }

    pub fn get_used_space(&self) -> usize {
        self.inner.as_ref().map_or(0, Storage::get_used_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, DEFAULT_QUOTA_BYTES};
    use crate::namespaces;
    use medinexus_kv::KvError;
    use medinexus_storage::{MemoryStore, UnavailableStore};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Preferences {
        theme: String,
        page_size: u32,
    }

    impl Default for Preferences {
        fn default() -> Self {
            Self {
                theme: "light".to_string(),
                page_size: 20,
            }
        }
    }

    #[test]
    fn test_available_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let storage = MedicalStorage::new(store.clone());
        assert!(storage.is_available());
        assert!(Arc::ptr_eq(storage.store(), &store));

        let prefs = storage.namespace(namespaces::PREFERENCES);
        let dark = Preferences {
            theme: "dark".to_string(),
            page_size: 50,
        };
        prefs.set_item("ui", &dark);
        assert_eq!(prefs.get_item("ui", Preferences::default()), dark);
        assert_eq!(prefs.get_all_keys(), vec!["ui"]);
        assert!(storage.used_space() > 0);
        assert_eq!(storage.used_space(), prefs.get_used_space());
    }

    #[test]
    fn test_unavailable_store_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let storage = MedicalStorage::new(Arc::new(UnavailableStore::default())).with_error_hook(
            Arc::new(move |_: &KvError| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(!storage.is_available());

        let patients = storage.namespace(namespaces::PATIENTS);
        assert!(!patients.is_available());
        patients.set_item("p-001", "王芳");
        assert_eq!(patients.get_item("p-001", String::from("none")), "none");
        assert!(!patients.has_key("p-001"));
        assert!(patients.get_all_keys().is_empty());
        patients.remove_item("p-001");
        patients.clear();
        assert_eq!(storage.used_space(), 0);

        // The store is never reached, so nothing is reported
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let storage = MedicalStorage::open(&Config::in_memory()).unwrap();
        let drafts = storage.namespace(namespaces::FORM_DRAFTS);
        let certs = storage.namespace(namespaces::CERTIFICATION);

        drafts.set_item("current", &serde_json::json!({"step": 2}));
        certs.set_item("current", &serde_json::json!({"status": "pending"}));
        drafts.clear();

        assert!(drafts.get_all_keys().is_empty());
        assert!(certs.has_key("current"));
        assert_eq!(storage.global().get_all_keys(), vec!["certification:current"]);
    }

    #[test]
    fn test_sqlite_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backend: Backend::Sqlite,
            database_path: dir.path().join("data/medinexus.db"),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        };

        {
            let storage = MedicalStorage::open(&config).unwrap();
            assert!(storage.is_available());
            let patients = storage.namespace(namespaces::PATIENTS);
            patients.set_item("b", &1);
            patients.set_item("a", &2);
            patients.set_item("b", &3);
        }

        let storage = MedicalStorage::open(&config).unwrap();
        let patients = storage.namespace(namespaces::PATIENTS);
        assert_eq!(patients.get_all_keys(), vec!["b", "a"]);
        assert_eq!(patients.get_item("b", 0), 3);
        assert_eq!(patients.get_item("a", 0), 2);
        // The availability check leaves nothing behind
        assert_eq!(storage.global().get_all_keys(), vec!["patients:b", "patients:a"]);
    }

    #[test]
    fn test_error_hook_is_attached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let store = Arc::new(MemoryStore::new());
        store.set_item("notifications:last", "{oops").unwrap();

        let storage = MedicalStorage::new(store).with_error_hook(Arc::new(move |_: &KvError| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let notifications = storage.namespace(namespaces::NOTIFICATIONS);

        assert_eq!(notifications.get_item("last", 0u64), 0);
        assert_eq!(notifications.get_item_with("missing", 1u64, |_| false), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
