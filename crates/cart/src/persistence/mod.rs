//! Key-value persistence backends for the cart.
//!
//! # Architecture
//!
//! The cart store treats its backend as an opaque asynchronous string store.
//! The whole cart lives under a single key as one JSON document; backends
//! never look inside the value.
//!
//! # Backends
//!
//! - [`MemoryBackend`] - In-process map, for tests and ephemeral carts
//! - [`FileBackend`] - One file per key under a base directory

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be used by this backend.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The backend is unavailable or rejected the operation.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Asynchronous string key-value store used to persist the cart.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
