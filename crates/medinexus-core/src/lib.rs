//! MediNexus Core
//!
//! Application-facing storage: configuration, logging, and
//! [`MedicalStorage`], which checks the backing store once and degrades every
//! operation to a default when it is unusable.

mod config;
mod error;
mod medical;
pub mod namespaces;

pub use config::{Backend, Config, DATA_DIR_ENV, DEFAULT_QUOTA_BYTES};
pub use error::CoreError;
pub use medical::{GuardedStorage, MedicalStorage};

// Re-export storage components
pub use medinexus_kv::{create, is_available, ErrorHook, KvError, Namespace, Storage};
pub use medinexus_storage::{
    KeyValueStore, MemoryStore, SqliteStore, StorageError, UnavailableStore,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Install the global fmt subscriber. `RUST_LOG` overrides the `info`
/// default. Later calls leave the first subscriber in place.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Logging already initialized");
    }
}
