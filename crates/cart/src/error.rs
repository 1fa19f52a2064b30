//! Error types surfaced by the cart crate.
//!
//! Cart mutations never fail from the caller's point of view: storage and
//! decode problems are logged by the store and recovered locally. The types
//! here cover the few places where an error does reach the caller. Backend
//! failures are [`crate::StorageError`], configuration failures are
//! [`crate::ConfigError`].

use thiserror::Error;

/// The cart accessor was used outside of a [`crate::CartProvider`] scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("use_cart must be used within a CartProvider scope")]
pub struct MissingProviderError;
