//! Integration tests for the cart store.
//!
//! These tests drive a `CartStore` through its public API and check the
//! stored value against the in-memory cart.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use go_marketplace_cart::{CartStore, MemoryBackend, PersistenceBackend, StoreOptions};
use go_marketplace_core::{Cart, CartChange, DecrementPolicy, LineItem};
use go_marketplace_integration_tests::{
    CART_KEY, RecordingBackend, UnavailableBackend, hat, pid, product, shirt,
};

async fn open_memory() -> (Arc<MemoryBackend>, CartStore) {
    let backend = Arc::new(MemoryBackend::new());
    let store = CartStore::open(backend.clone(), StoreOptions::default()).await;
    (backend, store)
}

async fn stored_cart(backend: &dyn PersistenceBackend) -> Cart {
    let json = backend.get(CART_KEY).await.unwrap().unwrap();
    Cart::from_json(&json).unwrap()
}

// =============================================================================
// Reference Scenario
// =============================================================================

#[tokio::test]
async fn test_reference_scenario_with_remove_policy() {
    let (_backend, store) = open_memory().await;

    store.add_to_cart(shirt());
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "a1");
    assert_eq!(products[0].quantity, 1);

    store.add_to_cart(shirt());
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].quantity, 2);

    store.increment(&pid("a1"));
    assert_eq!(store.products()[0].quantity, 3);

    store.decrement(&pid("a1"));
    assert_eq!(store.products()[0].quantity, 2);
    store.decrement(&pid("a1"));
    assert_eq!(store.products()[0].quantity, 1);
    assert_eq!(store.decrement(&pid("a1")), CartChange::Removed);
    assert!(store.products().is_empty());

    store.add_to_cart(shirt());
    store.add_to_cart(hat());
    let products = store.products();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "a1");
    assert_eq!(products[1].id, "b2");
}

#[tokio::test]
async fn test_reference_scenario_with_clamp_policy() {
    let options = StoreOptions {
        decrement_policy: DecrementPolicy::Clamp,
        ..StoreOptions::default()
    };
    let store = CartStore::open(Arc::new(MemoryBackend::new()), options).await;

    store.add_to_cart(shirt());
    store.add_to_cart(shirt());
    store.increment(&pid("a1"));
    store.decrement(&pid("a1"));
    store.decrement(&pid("a1"));
    store.decrement(&pid("a1"));
    assert_eq!(store.products()[0].quantity, 1);

    store.add_to_cart(hat());
    let ids: Vec<_> = store.products().into_iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![pid("a1"), pid("b2")]);
}

// =============================================================================
// Cart Invariants
// =============================================================================

#[tokio::test]
async fn test_add_sequences_never_duplicate_ids() {
    let (_backend, store) = open_memory().await;
    let ids = ["a1", "b2", "c3", "a1", "a1", "d4", "b2", "c3", "e5", "a1"];

    for (step, id) in ids.iter().cycle().take(50).enumerate() {
        store.add_to_cart(product(id, "Item", 100));

        let products = store.products();
        for (i, item) in products.iter().enumerate() {
            assert!(
                products.iter().skip(i + 1).all(|other| other.id != item.id),
                "duplicate {} after step {step}",
                item.id
            );
        }
    }

    assert_eq!(store.products().len(), 5);
    assert_eq!(store.item_count(), 50);
}

#[tokio::test]
async fn test_increment_changes_only_target_quantity() {
    let (_backend, store) = open_memory().await;
    store.add_to_cart(shirt());
    store.add_to_cart(hat());
    store.add_to_cart(product("c3", "Socks", 400));
    let before = store.products();

    store.increment(&pid("b2"));
    let after = store.products();

    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(
        after[1],
        LineItem {
            quantity: before[1].quantity + 1,
            ..before[1].clone()
        }
    );
}

#[tokio::test]
async fn test_add_existing_equals_increment() {
    let (_b1, via_add) = open_memory().await;
    let (_b2, via_increment) = open_memory().await;
    for store in [&via_add, &via_increment] {
        store.add_to_cart(shirt());
        store.add_to_cart(hat());
    }

    via_add.add_to_cart(shirt());
    via_increment.increment(&pid("a1"));

    assert_eq!(via_add.products(), via_increment.products());
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_serialized_cart_roundtrips() {
    let (_backend, store) = open_memory().await;
    store.add_to_cart(hat());
    store.add_to_cart(shirt());
    store.add_to_cart(product("c3", "Socks \"wool\"", 1));
    store.increment(&pid("a1"));

    let cart = store.cart();
    assert_eq!(Cart::from_json(&cart.to_json().unwrap()).unwrap(), cart);
}

#[tokio::test]
async fn test_persisted_cart_matches_memory_after_each_mutation() {
    let (backend, store) = open_memory().await;

    store.add_to_cart(shirt());
    store.flush().await;
    assert_eq!(stored_cart(backend.as_ref()).await, store.cart());

    store.add_to_cart(hat());
    store.flush().await;
    assert_eq!(stored_cart(backend.as_ref()).await, store.cart());

    store.add_to_cart(shirt());
    store.flush().await;
    assert_eq!(stored_cart(backend.as_ref()).await, store.cart());
    assert_eq!(stored_cart(backend.as_ref()).await.get(&pid("a1")).unwrap().quantity, 2);

    store.decrement(&pid("b2"));
    store.flush().await;
    assert_eq!(stored_cart(backend.as_ref()).await, store.cart());
}

#[tokio::test]
async fn test_first_add_persists_post_mutation_cart() {
    let backend = Arc::new(RecordingBackend::new());
    let store = CartStore::open(backend.clone(), StoreOptions::default()).await;

    store.add_to_cart(shirt());
    store.flush().await;

    let writes = backend.writes();
    assert_eq!(writes.len(), 1);
    let written = Cart::from_json(&writes[0]).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written.items()[0].id, "a1");
}

#[tokio::test]
async fn test_burst_of_mutations_ends_with_latest_cart() {
    let backend = Arc::new(RecordingBackend::new());
    let store = CartStore::open(backend.clone(), StoreOptions::default()).await;

    for _ in 0..20 {
        store.add_to_cart(shirt());
    }
    store.add_to_cart(hat());
    store.flush().await;

    let writes = backend.writes();
    assert!(!writes.is_empty());
    assert!(writes.len() <= 21);
    assert_eq!(Cart::from_json(writes.last().unwrap()).unwrap(), store.cart());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mutations_persist_final_cart() {
    let (backend, store) = open_memory().await;

    let mut tasks = Vec::new();
    for worker in 0..4 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..25 {
                store.add_to_cart(product(&format!("p{}", (worker + n) % 6), "Item", 100));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    store.flush().await;

    assert_eq!(store.item_count(), 100);
    assert_eq!(store.products().len(), 6);
    assert_eq!(stored_cart(backend.as_ref()).await, store.cart());
}

#[tokio::test]
async fn test_load_then_read_returns_stored_items() {
    let seeded = Cart::from_items(vec![
        LineItem::from(shirt()),
        LineItem {
            quantity: 4,
            ..LineItem::from(hat())
        },
        LineItem::from(product("c3", "Socks", 400)),
    ])
    .unwrap();
    let backend = Arc::new(MemoryBackend::with_entry(
        CART_KEY,
        seeded.to_json().unwrap(),
    ));

    let store = CartStore::open(backend, StoreOptions::default()).await;

    assert_eq!(store.products(), seeded.items());
    assert_eq!(store.products().len(), 3);
}

#[tokio::test]
async fn test_load_reads_foreign_written_json() {
    let json = r#"[{"id":"a1","title":"Shirt","image_url":"u","price":9.99,"quantity":3}]"#;
    let backend = Arc::new(MemoryBackend::with_entry(CART_KEY, json));

    let store = CartStore::open(backend, StoreOptions::default()).await;

    let item = store.get(&pid("a1")).unwrap();
    assert_eq!(item.quantity, 3);
    assert_eq!(item.price, shirt().price);
}

#[tokio::test]
async fn test_load_drops_zero_quantity_items_and_keeps_the_rest() {
    let json = r#"[
        {"id":"a1","title":"Shirt","image_url":"u","price":9.99,"quantity":0},
        {"id":"b2","title":"Hat","image_url":"u","price":15,"quantity":3}
    ]"#;
    let backend = Arc::new(MemoryBackend::with_entry(CART_KEY, json));
    let store = CartStore::open(backend.clone(), StoreOptions::default()).await;

    assert_eq!(store.products().len(), 1);
    assert_eq!(store.get(&pid("b2")).unwrap().quantity, 3);

    store.add_to_cart(shirt());
    store.flush().await;

    let stored = stored_cart(backend.as_ref()).await;
    assert_eq!(stored, store.cart());
    assert_eq!(stored.get(&pid("a1")).unwrap().quantity, 1);
    assert_eq!(stored.get(&pid("b2")).unwrap().quantity, 3);
}

#[tokio::test]
async fn test_store_uses_namespaced_key() {
    let backend = Arc::new(MemoryBackend::new());
    let options = StoreOptions {
        namespace: "@Staging".to_string(),
        ..StoreOptions::default()
    };
    let store = CartStore::open(backend.clone(), options).await;

    store.add_to_cart(shirt());
    store.flush().await;

    assert!(backend.get("@Staging:cart").await.unwrap().is_some());
    assert!(backend.get(CART_KEY).await.unwrap().is_none());
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_malformed_stored_cart_is_ignored() {
    for stored in ["not json", "{\"id\":\"a1\"}", "[{\"id\":\"a1\"}]", "null"] {
        let backend = Arc::new(MemoryBackend::with_entry(CART_KEY, stored));
        let store = CartStore::open(backend.clone(), StoreOptions::default()).await;

        assert!(store.is_ready());
        assert!(store.products().is_empty(), "loaded {stored:?}");

        store.add_to_cart(shirt());
        store.flush().await;
        assert_eq!(stored_cart(backend.as_ref()).await, store.cart());
    }
}

#[tokio::test]
async fn test_unavailable_backend_does_not_block_mutations() {
    let store = CartStore::open(Arc::new(UnavailableBackend), StoreOptions::default()).await;

    store.add_to_cart(shirt());
    store.add_to_cart(shirt());
    store.flush().await;

    assert_eq!(store.products()[0].quantity, 2);
    assert!(store.persist_failures() >= 1);
}
