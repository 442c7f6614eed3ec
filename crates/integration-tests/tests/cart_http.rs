//! End-to-end cart tests over HTTP.
//!
//! Each test serves a fake store API locally and drives the real client and
//! file storage against it.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rocketshoes_cart::{
    ApiError, CART_STORAGE_KEY, CartError, CartOutcome, CartStorage, CartState, FileStorage,
    Notification, ProductId, Rejection,
};
use rocketshoes_integration_tests::{FakeStoreApi, TestContext, sneaker};

fn persisted(ctx: &TestContext) -> Option<CartState> {
    FileStorage::new(ctx.storage_dir.path())
        .load(CART_STORAGE_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

// ============================================================================
// add_product
// ============================================================================

#[tokio::test]
async fn test_add_until_out_of_stock() {
    let api = FakeStoreApi::new().with_product(sneaker(1), 5);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    for _ in 0..5 {
        assert!(session.store.add_product(ProductId::new(1)).await.is_committed());
    }
    assert_eq!(session.amounts(), vec![(1, 5)]);
    assert!(session.notices().is_empty());

    let outcome = session.store.add_product(ProductId::new(1)).await;

    assert!(matches!(
        outcome,
        CartOutcome::Rejected(Rejection::OutOfStock {
            requested: 6,
            available: 5
        })
    ));
    assert_eq!(session.amounts(), vec![(1, 5)]);
    assert_eq!(session.notices(), vec![Notification::OutOfStock]);
    assert_eq!(persisted(&ctx).unwrap(), *session.store.cart());
}

#[tokio::test]
async fn test_new_line_carries_catalog_metadata() {
    let api = FakeStoreApi::new().with_product(sneaker(2), 3);
    let ctx = TestContext::start(&api).await;
    let session = ctx.open_session();

    session.store.add_product(ProductId::new(2)).await;

    let cart = session.store.cart();
    let line = cart.get(ProductId::new(2)).unwrap();
    assert_eq!(line.product, sneaker(2));
    assert_eq!(line.amount, 1);
}

#[tokio::test]
async fn test_stock_service_outage() {
    let api = FakeStoreApi::new().with_product(sneaker(1), 5);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    session.store.add_product(ProductId::new(1)).await;
    api.fail_stock_with(Some(StatusCode::SERVICE_UNAVAILABLE));

    let outcome = session.store.add_product(ProductId::new(1)).await;

    assert!(matches!(
        outcome,
        CartOutcome::Failed(CartError::Lookup(ApiError::Api { status: 503, .. }))
    ));
    assert_eq!(session.amounts(), vec![(1, 1)]);
    assert_eq!(session.notices(), vec![Notification::AddFailed]);

    let outcome = session
        .store
        .update_product_amount(ProductId::new(1), 2)
        .await;
    assert!(matches!(outcome, CartOutcome::Failed(CartError::Lookup(_))));
    assert_eq!(session.notices(), vec![Notification::UpdateFailed]);

    api.fail_stock_with(None);
    assert!(session.store.add_product(ProductId::new(1)).await.is_committed());
    assert_eq!(session.amounts(), vec![(1, 2)]);
}

#[tokio::test]
async fn test_unknown_product() {
    let api = FakeStoreApi::new();
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    let outcome = session.store.add_product(ProductId::new(404)).await;

    assert!(matches!(
        outcome,
        CartOutcome::Failed(CartError::Lookup(ApiError::NotFound(ref path))) if path == "stock/404"
    ));
    assert!(session.store.cart().is_empty());
    assert!(persisted(&ctx).is_none());
    assert_eq!(session.notices(), vec![Notification::AddFailed]);
}

#[tokio::test]
async fn test_catalog_metadata_is_cached_but_stock_is_not() {
    let api = FakeStoreApi::new().with_product(sneaker(3), 10);
    let ctx = TestContext::start(&api).await;
    let session = ctx.open_session();

    session.store.add_product(ProductId::new(3)).await;
    session.store.remove_product(ProductId::new(3)).await;
    session.store.add_product(ProductId::new(3)).await;

    assert_eq!(api.product_hits(), 1);
    assert_eq!(api.stock_hits(), 2);

    session.client.invalidate_catalog();
    session.store.remove_product(ProductId::new(3)).await;
    session.store.add_product(ProductId::new(3)).await;

    assert_eq!(api.product_hits(), 2);
    assert_eq!(api.stock_hits(), 3);
}

#[tokio::test]
async fn test_stock_drop_is_seen_immediately() {
    let api = FakeStoreApi::new().with_product(sneaker(1), 5);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    session.store.add_product(ProductId::new(1)).await;
    api.set_stock(1, 1);

    let outcome = session.store.add_product(ProductId::new(1)).await;

    assert!(matches!(outcome, CartOutcome::Rejected(_)));
    assert_eq!(session.notices(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_stock_body_without_id() {
    let api = FakeStoreApi::new()
        .with_product(sneaker(1), 2)
        .with_amount_only_stock();
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    assert!(session.store.add_product(ProductId::new(1)).await.is_committed());
    assert!(
        session
            .store
            .update_product_amount(ProductId::new(1), 2)
            .await
            .is_committed()
    );
    assert_eq!(session.amounts(), vec![(1, 2)]);

    let outcome = session.store.add_product(ProductId::new(1)).await;
    assert!(matches!(
        outcome,
        CartOutcome::Rejected(Rejection::OutOfStock {
            requested: 3,
            available: 2
        })
    ));
    assert_eq!(session.notices(), vec![Notification::OutOfStock]);
}

#[tokio::test]
async fn test_negative_stock_is_out_of_stock() {
    let api = FakeStoreApi::new().with_product(sneaker(1), -1);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    let outcome = session.store.add_product(ProductId::new(1)).await;

    assert!(matches!(
        outcome,
        CartOutcome::Rejected(Rejection::OutOfStock {
            requested: 1,
            available: -1
        })
    ));
    assert!(session.store.cart().is_empty());
    assert_eq!(session.notices(), vec![Notification::OutOfStock]);
}

// ============================================================================
// remove_product / update_product_amount
// ============================================================================

#[tokio::test]
async fn test_remove_keeps_remaining_order() {
    let api = FakeStoreApi::new()
        .with_product(sneaker(1), 5)
        .with_product(sneaker(2), 5);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    session.store.add_product(ProductId::new(1)).await;
    session.store.add_product(ProductId::new(1)).await;
    session.store.add_product(ProductId::new(2)).await;
    assert_eq!(session.amounts(), vec![(1, 2), (2, 1)]);

    assert!(session.store.remove_product(ProductId::new(1)).await.is_committed());
    assert_eq!(session.amounts(), vec![(2, 1)]);

    let outcome = session.store.remove_product(ProductId::new(1)).await;
    assert!(matches!(outcome, CartOutcome::Failed(CartError::NotInCart(_))));
    assert_eq!(session.notices(), vec![Notification::RemoveFailed]);
    assert_eq!(persisted(&ctx).unwrap(), *session.store.cart());
}

#[tokio::test]
async fn test_update_amount_against_stock() {
    let api = FakeStoreApi::new().with_product(sneaker(1), 3);
    let ctx = TestContext::start(&api).await;
    let mut session = ctx.open_session();

    session.store.add_product(ProductId::new(1)).await;

    assert!(
        session
            .store
            .update_product_amount(ProductId::new(1), 3)
            .await
            .is_committed()
    );
    assert_eq!(session.amounts(), vec![(1, 3)]);

    let outcome = session
        .store
        .update_product_amount(ProductId::new(1), 4)
        .await;
    assert!(matches!(outcome, CartOutcome::Rejected(Rejection::OutOfStock { .. })));
    assert_eq!(session.amounts(), vec![(1, 3)]);
    assert_eq!(session.notices(), vec![Notification::OutOfStock]);

    let hits = api.stock_hits();
    session
        .store
        .update_product_amount(ProductId::new(1), 0)
        .await;
    assert_eq!(api.stock_hits(), hits);
    assert!(session.notices().is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_reopened_cart_matches_previous_session() {
    let api = FakeStoreApi::new()
        .with_product(sneaker(5), 5)
        .with_product(sneaker(2), 5);
    let ctx = TestContext::start(&api).await;

    let first = ctx.open_session();
    first.store.add_product(ProductId::new(5)).await;
    first.store.add_product(ProductId::new(2)).await;
    first.store.add_product(ProductId::new(5)).await;
    let before = first.store.cart();
    drop(first);

    let reopened = ctx.open_session();
    assert_eq!(*reopened.store.cart(), *before);
    assert_eq!(reopened.amounts(), vec![(5, 2), (2, 1)]);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty_and_is_replaced() {
    let api = FakeStoreApi::new().with_product(sneaker(1), 5);
    let ctx = TestContext::start(&api).await;

    let storage = FileStorage::new(ctx.storage_dir.path());
    storage.store(CART_STORAGE_KEY, "[{\"id\": 1, \"amount\": ").unwrap();

    let session = ctx.open_session();
    assert!(session.store.cart().is_empty());

    session.store.add_product(ProductId::new(1)).await;
    assert_eq!(persisted(&ctx).unwrap().len(), 1);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let api = FakeStoreApi::new()
        .with_product(sneaker(1), 5)
        .requiring_token("rs_test_9f3a7c");
    let ctx = TestContext::start(&api).await;

    let mut anonymous = ctx.open_session();
    let outcome = anonymous.store.add_product(ProductId::new(1)).await;
    assert!(matches!(
        outcome,
        CartOutcome::Failed(CartError::Lookup(ApiError::Api { status: 401, .. }))
    ));
    assert_eq!(anonymous.notices(), vec![Notification::AddFailed]);
    drop(anonymous);

    let authed = ctx.open_session_with_token("rs_test_9f3a7c");
    assert!(authed.store.add_product(ProductId::new(1)).await.is_committed());
}
