//! Ambient access to the cart for deeply nested consumers.
//!
//! Prefer passing a [`CartStore`] handle explicitly. When a consumer tree
//! cannot thread the handle through, run it inside [`CartProvider::scope`]
//! and call [`use_cart`] from anywhere within that task.
//!
//! The scope is a Tokio task-local: it covers the future passed to `scope`
//! and everything it awaits, but not tasks spawned from it.
//!
//! ```rust,ignore
//! CartProvider::scope(store, async {
//!     let cart = use_cart();
//!     cart.increment(&id);
//! })
//! .await;
//! ```

use std::future::Future;

use crate::error::MissingProviderError;
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// Installs a [`CartStore`] as the ambient cart for a future.
#[derive(Debug, Clone, Copy)]
pub struct CartProvider;

impl CartProvider {
    /// Run `future` with `store` available through [`use_cart`].
    pub async fn scope<F>(store: CartStore, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CART.scope(store, future).await
    }

    /// Run `f` synchronously with `store` available through [`use_cart`].
    pub fn sync_scope<R>(store: CartStore, f: impl FnOnce() -> R) -> R {
        CURRENT_CART.sync_scope(store, f)
    }
}

/// Get the cart installed by the enclosing [`CartProvider`] scope.
///
/// # Errors
///
/// Returns [`MissingProviderError`] when called outside a provider scope.
pub fn try_use_cart() -> Result<CartStore, MissingProviderError> {
    CURRENT_CART
        .try_with(CartStore::clone)
        .map_err(|_| MissingProviderError)
}

/// Get the cart installed by the enclosing [`CartProvider`] scope.
///
/// # Panics
///
/// Panics when called outside a provider scope. That is a wiring bug in the
/// caller, not a runtime condition to recover from.
#[track_caller]
#[must_use]
pub fn use_cart() -> CartStore {
    match try_use_cart() {
        Ok(store) => store,
        Err(e) => panic!("{e}"),
    }
}
