//! Core types for Go Marketplace.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;

pub use cart::{Cart, CartChange, CartDataError, CatalogProduct, DecrementPolicy, LineItem};
pub use id::{ProductId, ProductIdError};
pub use price::Price;
