//! Store for contexts where no persistent storage exists

use crate::error::StorageError;
use crate::store::KeyValueStore;
use crate::Result;

/// Every operation fails with [`StorageError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> StorageError {
        StorageError::Unavailable(self.reason.clone())
    }
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new("no storage in this context")
    }
}

impl KeyValueStore for UnavailableStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Err(self.err())
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Err(self.err())
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        Err(self.err())
    }

    fn clear(&self) -> Result<()> {
        Err(self.err())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Err(self.err())
    }
}
