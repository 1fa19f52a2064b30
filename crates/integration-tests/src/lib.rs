//! Integration tests for Go Marketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart operations and their persistence
//! - `cart_context` - Ambient cart accessor
//! - `file_backend` - Cart persisted to disk across store instances
//!
//! This crate only hosts shared fixtures; the tests live in `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;

use async_trait::async_trait;
use go_marketplace_cart::{MemoryBackend, PersistenceBackend, StorageError};
use go_marketplace_core::{CatalogProduct, Price, ProductId};

/// Storage key used by stores created with default options.
pub const CART_KEY: &str = "@GoMarketplace:cart";

/// Build a catalog product with a parsed ID.
///
/// # Panics
///
/// Panics if `id` is not a valid product ID.
#[must_use]
pub fn product(id: &str, title: &str, cents: i64) -> CatalogProduct {
    CatalogProduct {
        id: pid(id),
        title: title.to_string(),
        image_url: "u".to_string(),
        price: Price::from_cents(cents),
    }
}

/// The shirt from the reference scenario.
#[must_use]
pub fn shirt() -> CatalogProduct {
    product("a1", "Shirt", 999)
}

/// The hat from the reference scenario.
#[must_use]
pub fn hat() -> CatalogProduct {
    product("b2", "Hat", 1500)
}

/// Parse a product ID.
///
/// # Panics
///
/// Panics if `id` is not a valid product ID.
#[must_use]
pub fn pid(id: &str) -> ProductId {
    match ProductId::parse(id) {
        Ok(id) => id,
        Err(e) => panic!("invalid product id {id:?}: {e}"),
    }
}

/// In-memory backend that also records every value written.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    writes: Mutex<Vec<String>>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every value passed to `set`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the write log lock is poisoned.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        match self.writes.lock() {
            Ok(writes) => writes.clone(),
            Err(e) => panic!("write log poisoned: {e}"),
        }
    }
}

#[async_trait]
impl PersistenceBackend for RecordingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(value.to_owned());
        }
        self.inner.set(key, value).await
    }
}

/// Backend whose every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

#[async_trait]
impl PersistenceBackend for UnavailableBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }
}
