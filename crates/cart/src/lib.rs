//! Go Marketplace Cart - Persistent shopping cart store.
//!
//! # Architecture
//!
//! - [`CartStore`] holds the cart in memory and writes it through to a
//!   [`PersistenceBackend`] in the background
//! - The stored cart is loaded once, when the store is created
//! - Consumers receive the store as a cloneable handle, or look it up through
//!   [`use_cart`] inside a [`CartProvider`] scope
//!
//! # Modules
//!
//! - [`config`] - Environment configuration and store options
//! - [`context`] - Ambient cart accessor
//! - [`error`] - Error types
//! - [`persistence`] - Backend trait plus memory and file backends
//! - [`store`] - The cart store itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
pub mod persistence;
pub mod store;

pub use config::{CartConfig, ConfigError, StoreOptions};
pub use context::{CartProvider, try_use_cart, use_cart};
pub use error::MissingProviderError;
pub use persistence::{FileBackend, MemoryBackend, PersistenceBackend, StorageError};
pub use store::CartStore;
