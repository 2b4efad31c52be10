//! The backing store capability

use crate::Result;

/// A synchronous, string-keyed, string-valued dictionary with finite capacity.
///
/// Implementations are shared behind `Arc` by every handle that views them,
/// so all methods take `&self` and rely on interior locking.
pub trait KeyValueStore: Send + Sync {
    /// Raw value for `key`, or `None` when absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Remove every key in the store.
    fn clear(&self) -> Result<()>;

    /// All keys in enumeration order.
    fn keys(&self) -> Result<Vec<String>>;

    fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Approximate bytes taken by one entry: two bytes per UTF-16 code unit of
/// key and value.
pub fn entry_size(key: &str, value: &str) -> usize {
    (key.encode_utf16().count() + value.encode_utf16().count()) * 2
}
