//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Add a product (or bump its quantity)
//! gm-cli add --id a1 --title Shirt --image-url https://cdn.example.com/a1.png --price 9.99
//!
//! # Change quantities
//! gm-cli increment a1
//! gm-cli decrement a1
//!
//! # Show the cart
//! gm-cli list
//! ```
//!
//! # Environment Variables
//!
//! - `GO_MARKETPLACE_DATA_DIR` - Directory holding the stored cart
//! - `GO_MARKETPLACE_NAMESPACE` - Storage key namespace
//! - `GO_MARKETPLACE_DECREMENT_POLICY` - `remove` or `clamp`

use std::fmt::Write as _;
use std::sync::Arc;

use go_marketplace_cart::{CartConfig, CartStore, FileBackend};
use go_marketplace_core::{Cart, CartChange, CatalogProduct, ProductId};
use thiserror::Error;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// The cart was updated in memory but could not be written.
    #[error("Failed to save cart to {0}")]
    PersistFailed(String),

    /// The product is not in the cart.
    #[error("Product not in cart: {0}")]
    NotInCart(ProductId),
}

/// A single cart operation requested on the command line.
#[derive(Debug, Clone)]
pub enum CartAction {
    Add(CatalogProduct),
    Increment(ProductId),
    Decrement(ProductId),
    List,
}

/// Open the cart stored in the configured data directory.
pub async fn open_store(config: &CartConfig) -> CartStore {
    let backend = Arc::new(FileBackend::new(&config.data_dir));
    CartStore::open(backend, config.store.clone()).await
}

/// Apply `action` to the stored cart and wait for the result to be saved.
///
/// # Returns
///
/// The cart after the action.
pub async fn run(store: &CartStore, action: CartAction) -> Result<Cart, CartCommandError> {
    let failures_before = store.persist_failures();

    let change = match action {
        CartAction::Add(product) => Some(store.add_to_cart(product)),
        CartAction::Increment(id) => Some(require_present(store.increment(&id), id)?),
        CartAction::Decrement(id) => Some(require_present(store.decrement(&id), id)?),
        CartAction::List => None,
    };

    if let Some(change) = change {
        store.flush().await;
        if store.persist_failures() > failures_before {
            return Err(CartCommandError::PersistFailed(
                store.storage_key().to_owned(),
            ));
        }
        tracing::info!(?change, "Cart saved");
    }

    Ok(store.cart())
}

fn require_present(
    change: CartChange,
    id: ProductId,
) -> Result<CartChange, CartCommandError> {
    match change {
        CartChange::NotFound => Err(CartCommandError::NotInCart(id)),
        other => Ok(other),
    }
}

/// Render a cart as a plain-text listing.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart.items() {
        let _ = writeln!(
            out,
            "{:>4} x {} [{}] @ {}",
            item.quantity, item.title, item.id, item.price
        );
    }
    let _ = writeln!(out, "{} item(s)", cart.item_count());
    out
}
