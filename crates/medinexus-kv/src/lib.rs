//! MediNexus Key-Value Storage
//!
//! JSON values over a [`KeyValueStore`], optionally scoped to a namespace.
//! A namespaced handle stores `key` physically as `"<namespace>:key"` and only
//! ever sees keys carrying that prefix.
//!
//! The plain methods never fail: errors are logged, handed to an optional
//! [`ErrorHook`], and turned into a default value or a no-op. Every such
//! method has a `try_` counterpart returning [`Result`].

mod error;
mod namespace;
mod storage;

use std::sync::Arc;

pub use error::KvError;
pub use medinexus_storage::{KeyValueStore, StorageError};
pub use namespace::Namespace;
pub use storage::{ErrorHook, Storage};

pub type Result<T> = std::result::Result<T, KvError>;

/// Key written and removed by [`is_available`].
pub const PROBE_KEY: &str = "__storage_test__";

/// Handle whose keys all live under `namespace`.
pub fn create(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Storage {
    Storage::namespaced(store, namespace)
}

/// Round-trips a sentinel through `store`. False if any step fails or the
/// value read back differs.
pub fn is_available(store: &dyn KeyValueStore) -> bool {
    let probe = || -> medinexus_storage::Result<bool> {
        store.set_item(PROBE_KEY, PROBE_KEY)?;
        let read = store.get_item(PROBE_KEY)?;
        store.remove_item(PROBE_KEY)?;
        Ok(read.as_deref() == Some(PROBE_KEY))
    };

    match probe() {
        Ok(available) => available,
        Err(e) => {
            tracing::debug!(error = %e, "Storage probe failed");
            false
        }
    }
}
