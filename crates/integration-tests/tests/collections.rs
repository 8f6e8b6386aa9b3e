//! Integration tests for favorites, notifications, orders and the session
//! gate in front of every mutating operation.

use rust_decimal::Decimal;
use shopmate_client::ClientError;
use shopmate_client::clock::Clock;
use shopmate_client::remote::{DocumentPath, DocumentStore, field, get_typed};
use shopmate_client::services::{
    CartService, CheckoutRequest, FavoritesService, NotificationService, OrderService,
};
use shopmate_core::{
    FavoriteOutcome, NotificationDraft, NotificationId, OrderBook, OrderId, OrderStatus, ProductId,
};
use shopmate_integration_tests::{EMAIL, TestContext, password, product, test_config};

// =============================================================================
// Favorites
// =============================================================================

#[tokio::test]
async fn test_toggle_favorite_is_self_inverse() {
    let ctx = TestContext::new();
    let profile = ctx.register().await;
    let favorites = FavoritesService::new(&ctx.state);
    favorites.toggle_favorite(&product(1, 10)).await.unwrap();
    let original = favorites.favorites();

    let p = product(2, 20);
    assert_eq!(favorites.toggle_favorite(&p).await.unwrap(), FavoriteOutcome::Added);
    assert_eq!(favorites.toggle_favorite(&p).await.unwrap(), FavoriteOutcome::Removed);

    assert_eq!(favorites.favorites(), original);
    let remote = ctx
        .store
        .get(&DocumentPath::user_field(&profile.uid, field::FAVORITES))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remote, serde_json::to_value(&original).unwrap());
}

#[tokio::test]
async fn test_favorite_notifications_name_the_product() {
    let ctx = TestContext::new();
    ctx.register().await;
    let p = product(5, 10);

    ctx.tick(1);
    FavoritesService::new(&ctx.state)
        .toggle_favorite(&p)
        .await
        .unwrap();

    let latest = NotificationService::new(&ctx.state)
        .entries()
        .pop()
        .unwrap();
    assert!(latest.description.contains(&p.name));
    assert!(!latest.read);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notification_id_is_creation_millis() {
    let ctx = TestContext::new();
    ctx.register().await;
    ctx.tick(42);

    let appended = NotificationService::new(&ctx.state)
        .append(NotificationDraft::new("Sale", "Everything half off", "pricetag"))
        .await
        .unwrap();

    assert_eq!(appended.id.as_i64(), ctx.clock.now().timestamp_millis());
    assert_eq!(appended.timestamp.timestamp_millis(), appended.id.as_i64());
}

#[tokio::test]
async fn test_mark_as_read_and_clear_all() {
    let ctx = TestContext::new();
    let profile = ctx.register().await;
    let service = NotificationService::new(&ctx.state);
    ctx.tick(1);
    let sale = service
        .append(NotificationDraft::new("Sale", "Half off", "pricetag"))
        .await
        .unwrap();

    assert!(service.mark_as_read(sale.id).await.unwrap());
    assert!(!service.mark_as_read(NotificationId::new(1)).await.unwrap());
    assert_eq!(service.unread_count(), 1);

    service.clear_all().await.unwrap();
    assert!(service.entries().is_empty());
    let remote = ctx
        .store
        .get(&DocumentPath::user_field(&profile.uid, field::NOTIFICATIONS))
        .await
        .unwrap();
    assert_eq!(remote, Some(serde_json::json!([])));
}

#[tokio::test]
async fn test_time_ago_is_recomputed() {
    let ctx = TestContext::new();
    ctx.register().await;
    let service = NotificationService::new(&ctx.state);
    let welcome = service.entries().remove(0);

    ctx.tick(59);
    assert_eq!(service.time_ago(&welcome), "59 secs ago");
    ctx.tick(1);
    assert_eq!(service.time_ago(&welcome), "1 min ago");
    ctx.tick(2 * 60 * 60);
    assert_eq!(service.time_ago(&welcome), "2 hours ago");
    ctx.tick(3 * 24 * 60 * 60);
    assert_eq!(service.time_ago(&welcome), "3 days ago");
    ctx.tick(14 * 24 * 60 * 60);
    assert_eq!(service.time_ago(&welcome), "2 weeks ago");
}

// =============================================================================
// Orders
// =============================================================================

/// Reusing an order id replaces the earlier order instead of adding one.
#[tokio::test]
async fn test_create_order_with_repeated_id_overwrites() {
    let ctx = TestContext::new();
    let profile = ctx.register().await;
    let orders = OrderService::new(&ctx.state);
    let id = OrderId::new("ORD-1");

    orders
        .create_order(id.clone(), Decimal::from(500), vec![])
        .await
        .unwrap();
    ctx.tick(1);
    orders
        .create_order(id.clone(), Decimal::from(999), vec![])
        .await
        .unwrap();

    let local = orders.orders(None);
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].total, Decimal::from(999));
    assert_eq!(local[0].status, OrderStatus::Processing);

    let remote: OrderBook = get_typed(
        ctx.store.as_ref(),
        &DocumentPath::user_field(&profile.uid, field::ORDERS),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(remote.len(), 1);
    assert_eq!(remote.get(&id).unwrap().total, Decimal::from(999));
}

#[tokio::test]
async fn test_create_order_keeps_orders_written_elsewhere() {
    let ctx = TestContext::new();
    let profile = ctx.register().await;
    let path = DocumentPath::user_field(&profile.uid, field::ORDERS);
    let other = ctx.restart(test_config());
    other
        .session()
        .login(EMAIL, &password())
        .await
        .unwrap();

    OrderService::new(&other.state)
        .create_order(OrderId::new("ORD-A"), Decimal::ONE, vec![])
        .await
        .unwrap();
    OrderService::new(&ctx.state)
        .create_order(OrderId::new("ORD-B"), Decimal::TWO, vec![])
        .await
        .unwrap();

    let remote: OrderBook = get_typed(ctx.store.as_ref(), &path).await.unwrap().unwrap();
    assert_eq!(remote.len(), 2);
    // Local state only learns about ORD-A on the next sync
    assert_eq!(OrderService::new(&ctx.state).orders(None).len(), 1);
}

// =============================================================================
// Session Gate
// =============================================================================

#[tokio::test]
async fn test_every_mutation_requires_a_session() {
    let ctx = TestContext::new();
    let p = product(1, 10);
    let cart = CartService::new(&ctx.state);
    let favorites = FavoritesService::new(&ctx.state);
    let notifications = NotificationService::new(&ctx.state);
    let orders = OrderService::new(&ctx.state);

    let results = vec![
        favorites.toggle_favorite(&p).await.map(|_| ()),
        cart.increase_quantity(&p).await.map(|_| ()),
        cart.decrease_quantity(ProductId::new(1)).await.map(|_| ()),
        cart.remove_item(Some(ProductId::new(1))).await,
        cart.remove_item(None).await,
        notifications
            .append(NotificationDraft::new("t", "d", "i"))
            .await
            .map(|_| ()),
        notifications
            .mark_as_read(NotificationId::new(1))
            .await
            .map(|_| ()),
        notifications.clear_all().await,
        orders
            .create_order(OrderId::new("ORD-9"), Decimal::ONE, vec![])
            .await
            .map(|_| ()),
        orders.checkout(CheckoutRequest::default()).await.map(|_| ()),
        ctx.session().update_profile_photo("https://x.test/p.png").await,
    ];

    for result in results {
        assert!(matches!(result, Err(ClientError::NoActiveSession)));
    }

    let state = ctx.state.snapshot();
    assert!(state.favorites.is_empty());
    assert!(state.cart.is_empty());
    assert!(state.notifications.is_empty());
    assert!(state.orders.is_empty());
    assert_eq!(ctx.store.write_count(), 0);
}

#[tokio::test]
async fn test_session_error_has_user_message() {
    let ctx = TestContext::new();
    let err = CartService::new(&ctx.state)
        .increase_quantity(&product(1, 1))
        .await
        .unwrap_err();

    let message = err.user_message();
    assert!(!message.title.is_empty());
    assert!(!message.body.is_empty());
    assert!(!err.is_reportable());
}
