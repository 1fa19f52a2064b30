//! Cart state and its transitions.
//!
//! A [`Cart`] is an ordered list of [`LineItem`]s with at most one entry per
//! product. All transitions are pure and synchronous; persistence lives in
//! the `go-marketplace-cart` crate.
//!
//! # Wire format
//!
//! A cart is stored as a JSON array of line items:
//!
//! ```json
//! [{"id":"a1","title":"Shirt","image_url":"u","price":9.99,"quantity":2}]
//! ```

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors produced when a stored cart does not decode to a valid [`Cart`].
#[derive(Debug, thiserror::Error)]
pub enum CartDataError {
    /// The value is not a JSON array of line items.
    #[error("malformed cart data: {0}")]
    Json(#[from] serde_json::Error),

    /// The same product appears more than once.
    #[error("duplicate line item for product {0}")]
    DuplicateProduct(ProductId),
}

/// What to do when a line item at quantity 1 is decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecrementPolicy {
    /// Drop the line item from the cart.
    #[default]
    Remove,
    /// Keep the line item at quantity 1.
    Clamp,
}

impl std::fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Clamp => write!(f, "clamp"),
        }
    }
}

impl std::str::FromStr for DecrementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(Self::Remove),
            "clamp" => Ok(Self::Clamp),
            _ => Err(format!("invalid decrement policy: {s}")),
        }
    }
}

/// A product as offered by the catalog, before it is placed in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
}

impl From<CatalogProduct> for LineItem {
    fn from(product: CatalogProduct) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: 1,
        }
    }
}

/// Outcome of a single cart transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line item was appended with quantity 1.
    Added,
    /// The quantity of an existing line item changed to the given value.
    Quantity(u32),
    /// The line item was dropped after its quantity reached zero.
    Removed,
    /// No line item matched the product ID.
    NotFound,
}

/// The full ordered collection of line items.
///
/// Insertion order is preserved; adding a product that is already present
/// bumps its quantity in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, checking the cart invariants.
    ///
    /// Items with a zero quantity are dropped, the same as decrementing them
    /// out of the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if two remaining items share a product ID.
    pub fn from_items(mut items: Vec<LineItem>) -> Result<Self, CartDataError> {
        items.retain(|item| item.quantity > 0);
        for (index, item) in items.iter().enumerate() {
            if items.iter().take(index).any(|prior| prior.id == item.id) {
                return Err(CartDataError::DuplicateProduct(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Decode a cart from its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON array of line items or
    /// violates the cart invariants.
    pub fn from_json(json: &str) -> Result<Self, CartDataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the cart into its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CartDataError> {
        Ok(serde_json::to_string(&self.items)?)
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    pub fn add(&mut self, product: CatalogProduct) -> CartChange {
        if self.get(&product.id).is_some() {
            return self.increment(&product.id);
        }
        self.items.push(LineItem::from(product));
        CartChange::Added
    }

    /// Increase the quantity of a line item by one.
    pub fn increment(&mut self, id: &ProductId) -> CartChange {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                CartChange::Quantity(item.quantity)
            }
            None => CartChange::NotFound,
        }
    }

    /// Decrease the quantity of a line item by one.
    ///
    /// A line item at quantity 1 is handled according to `policy`.
    pub fn decrement(&mut self, id: &ProductId, policy: DecrementPolicy) -> CartChange {
        let Some((position, item)) = self
            .items
            .iter_mut()
            .enumerate()
            .find(|(_, item)| &item.id == id)
        else {
            return CartChange::NotFound;
        };

        if item.quantity > 1 {
            item.quantity -= 1;
            return CartChange::Quantity(item.quantity);
        }

        match policy {
            DecrementPolicy::Clamp => CartChange::Quantity(item.quantity),
            DecrementPolicy::Remove => {
                self.items.remove(position);
                CartChange::Removed
            }
        }
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartDataError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
