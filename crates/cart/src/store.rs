//! The cart store shared across consumers.
//!
//! # Persistence
//!
//! Every mutation is applied to the in-memory cart under one lock, and the
//! post-mutation cart is serialized before that lock is released. The
//! snapshot is handed to a single background writer through a
//! `tokio::sync::watch` channel, so writes reach the backend in mutation
//! order and the last write always carries the newest cart. Bursts of
//! mutations may coalesce into a single write.
//!
//! The writer loads the stored cart before it performs any write, so the
//! stored value can never be overwritten before it has been read.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use go_marketplace_cart::{CartStore, MemoryBackend, StoreOptions};
//!
//! let store = CartStore::open(Arc::new(MemoryBackend::new()), StoreOptions::default()).await;
//! store.add_to_cart(product);
//! store.flush().await;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use go_marketplace_core::{Cart, CartChange, CatalogProduct, LineItem, ProductId};
use tokio::sync::watch;

use crate::config::StoreOptions;
use crate::persistence::PersistenceBackend;

/// Serialized cart waiting to be written.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    revision: u64,
    json: Option<Arc<str>>,
}

/// Cart contents plus the revision that produced them.
#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    revision: u64,
}

/// State shared between store handles and the persistence writer.
#[derive(Debug)]
struct Shared {
    state: Mutex<CartState>,
    /// Highest revision the writer has finished with.
    persisted: watch::Sender<u64>,
    /// Set once the initial load has completed.
    ready: watch::Sender<bool>,
    persist_failures: AtomicU64,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_persisted(&self, revision: u64) {
        self.persisted.send_if_modified(|persisted| {
            if revision > *persisted {
                *persisted = revision;
                true
            } else {
                false
            }
        });
    }
}

/// Shared, persistent shopping cart.
///
/// This struct is cheaply cloneable via `Arc`; every clone refers to the same
/// cart. Mutations apply immediately to the in-memory cart and are written to
/// the backend in the background. Persistence failures are logged and never
/// reach the caller.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    options: StoreOptions,
    key: String,
    shared: Arc<Shared>,
    snapshots: watch::Sender<Snapshot>,
}

impl CartStore {
    /// Create a store and start loading the stored cart in the background.
    ///
    /// The cart starts out empty; use [`Self::ready`] to wait for the stored
    /// cart to be loaded, or [`Self::open`] to do both in one call.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn new(backend: Arc<dyn PersistenceBackend>, options: StoreOptions) -> Self {
        let key = options.storage_key();
        let (snapshots, snapshot_rx) = watch::channel(Snapshot::default());
        let shared = Arc::new(Shared {
            state: Mutex::new(CartState::default()),
            persisted: watch::Sender::new(0),
            ready: watch::Sender::new(false),
            persist_failures: AtomicU64::new(0),
        });

        let writer = PersistenceWriter {
            backend,
            key: key.clone(),
            shared: Arc::clone(&shared),
            snapshots: snapshot_rx,
        };
        tokio::spawn(writer.run());

        Self {
            inner: Arc::new(CartStoreInner {
                options,
                key,
                shared,
                snapshots,
            }),
        }
    }

    /// Create a store and wait for the stored cart to be loaded.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub async fn open(backend: Arc<dyn PersistenceBackend>, options: StoreOptions) -> Self {
        let store = Self::new(backend, options);
        store.ready().await;
        store
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    pub fn add_to_cart(&self, product: CatalogProduct) -> CartChange {
        let id = product.id.clone();
        self.mutate("add_to_cart", &id, |cart| cart.add(product))
    }

    /// Increase the quantity of a line item by one.
    pub fn increment(&self, id: &ProductId) -> CartChange {
        self.mutate("increment", id, |cart| cart.increment(id))
    }

    /// Decrease the quantity of a line item by one.
    ///
    /// A line item at quantity 1 is removed or kept according to the
    /// configured [`go_marketplace_core::DecrementPolicy`].
    pub fn decrement(&self, id: &ProductId) -> CartChange {
        let policy = self.inner.options.decrement_policy;
        self.mutate("decrement", id, |cart| cart.decrement(id, policy))
    }

    /// Current line items in cart order.
    #[must_use]
    pub fn products(&self) -> Vec<LineItem> {
        self.inner.shared.lock_state().cart.items().to_vec()
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.shared.lock_state().cart.clone()
    }

    /// Line item for a product, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<LineItem> {
        self.inner.shared.lock_state().cart.get(id).cloned()
    }

    /// Sum of quantities across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.shared.lock_state().cart.item_count()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.shared.lock_state().cart.is_empty()
    }

    /// Counter bumped by every mutation and by a successful load.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.shared.lock_state().revision
    }

    /// Whether the initial load has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.inner.shared.ready.borrow()
    }

    /// Wait until the initial load has completed.
    ///
    /// Completes even when nothing was stored or the stored value was
    /// unreadable.
    pub async fn ready(&self) {
        let mut ready = self.inner.shared.ready.subscribe();
        // The sender lives in `shared`, which this handle keeps alive.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Wait until every mutation made before this call has been handed to
    /// the backend, successfully or not.
    pub async fn flush(&self) {
        let target = self.revision();
        let mut persisted = self.inner.shared.persisted.subscribe();
        let _ = persisted.wait_for(|persisted| *persisted >= target).await;
    }

    /// Number of backend writes that have failed so far.
    #[must_use]
    pub fn persist_failures(&self) -> u64 {
        self.inner.shared.persist_failures.load(Ordering::Relaxed)
    }

    /// The key under which the cart is stored.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    /// Apply a transition and publish the resulting cart to the writer.
    fn mutate(
        &self,
        operation: &'static str,
        id: &ProductId,
        apply: impl FnOnce(&mut Cart) -> CartChange,
    ) -> CartChange {
        let mut state = self.inner.shared.lock_state();
        let change = apply(&mut state.cart);
        state.revision += 1;

        let json = match state.cart.to_json() {
            Ok(json) => Some(Arc::from(json)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize cart");
                None
            }
        };
        let revision = state.revision;
        self.inner.snapshots.send_replace(Snapshot { revision, json });
        drop(state);

        tracing::debug!(operation, product_id = %id, ?change, revision, "Cart updated");
        change
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .field("options", &self.inner.options)
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

/// Background task that loads the stored cart once and then writes snapshots.
struct PersistenceWriter {
    backend: Arc<dyn PersistenceBackend>,
    key: String,
    shared: Arc<Shared>,
    snapshots: watch::Receiver<Snapshot>,
}

impl PersistenceWriter {
    async fn run(mut self) {
        self.initialize().await;
        self.shared.ready.send_replace(true);

        while self.snapshots.changed().await.is_ok() {
            let snapshot = self.snapshots.borrow_and_update().clone();
            self.write(snapshot).await;
        }

        // All handles dropped; make sure the final cart is not lost. A load
        // marks its revision persisted, so snapshots it replaced stay unwritten.
        let last = self.snapshots.borrow().clone();
        if last.revision > *self.shared.persisted.borrow() {
            self.write(last).await;
        }
        tracing::debug!(key = %self.key, "Cart persistence writer stopped");
    }

    /// Load the stored cart, replacing the in-memory cart if it decodes.
    async fn initialize(&mut self) {
        let stored = match self.backend.get(&self.key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::info!(key = %self.key, "No stored cart found");
                return;
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read stored cart");
                return;
            }
        };

        let cart = match Cart::from_json(&stored) {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Ignoring malformed stored cart");
                return;
            }
        };

        let items = cart.len();
        let revision = {
            let mut state = self.shared.lock_state();
            state.cart = cart;
            state.revision += 1;
            // Snapshots taken before the load describe a cart that was just
            // replaced; the backend already holds the loaded one.
            let _ = self.snapshots.borrow_and_update();
            state.revision
        };
        self.shared.mark_persisted(revision);

        tracing::info!(key = %self.key, items, revision, "Loaded stored cart");
    }

    async fn write(&self, snapshot: Snapshot) {
        if let Some(json) = &snapshot.json {
            match self.backend.set(&self.key, json).await {
                Ok(()) => {
                    tracing::debug!(key = %self.key, revision = snapshot.revision, "Cart persisted");
                }
                Err(e) => {
                    self.shared.persist_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        key = %self.key,
                        revision = snapshot.revision,
                        error = %e,
                        "Failed to persist cart"
                    );
                }
            }
        }
        self.shared.mark_persisted(snapshot.revision);
    }
}
