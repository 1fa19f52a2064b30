//! Go Marketplace Core - Shared cart types.
//!
//! This crate provides the types used across all Go Marketplace components:
//! - `cart` - The cart store with its persistence discipline
//! - `cli` - Command-line front end for inspecting and editing a cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no async runtime, no storage backends. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, line items, and the cart state itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
