//! MediNexus Storage Layer
//!
//! Synchronous string-keyed, string-valued backing stores.
//! Everything above this crate talks to a store through [`KeyValueStore`].

mod error;
mod memory;
mod schema;
mod sqlite;
mod store;
mod unavailable;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{entry_size, KeyValueStore};
pub use unavailable::UnavailableStore;

pub type Result<T> = std::result::Result<T, StorageError>;
