//! Scripted shopping session.
//!
//! Runs register, cart, favorites, checkout, notifications, logout and
//! login against the in-memory document store and identity provider, and
//! logs every step. Nothing leaves the process except an optional catalog
//! fetch.

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;
use shopmate_client::AppState;
use shopmate_client::catalog::CatalogClient;
use shopmate_client::config::ClientConfig;
use shopmate_client::identity::InMemoryIdentityProvider;
use shopmate_client::remote::InMemoryDocumentStore;
use shopmate_client::services::{
    CartService, CheckoutRequest, FavoritesService, NotificationService, OrderService,
    RegisterRequest, SessionService,
};
use shopmate_core::{DeliveryTier, ProductId, ProductRef};
use tracing::info;

const DEMO_EMAIL: &str = "demo@shopmate.test";
const SAMPLE_SIZE: usize = 3;

fn sample_products() -> Vec<ProductRef> {
    vec![
        ProductRef::new(ProductId::new(1), "Alphonso Mango (1 kg)", Decimal::new(34900, 2))
            .with_category("fruits"),
        ProductRef::new(ProductId::new(2), "Cold Pressed Coconut Oil", Decimal::new(21000, 2))
            .with_category("grocery"),
        ProductRef::new(ProductId::new(3), "Bamboo Toothbrush", Decimal::new(9900, 2))
            .with_category("personal care"),
    ]
}

/// Run the scripted session.
///
/// # Errors
///
/// Returns the first error any step produces.
pub async fn run(config: ClientConfig, live_catalog: bool) -> Result<(), Box<dyn std::error::Error>> {
    let products: Vec<ProductRef> = if live_catalog {
        let catalog = CatalogClient::new(&config.catalog);
        catalog
            .products()
            .await?
            .iter()
            .filter(|p| p.in_stock)
            .take(SAMPLE_SIZE)
            .cloned()
            .collect()
    } else {
        sample_products()
    };
    let [first, second, ..] = products.as_slice() else {
        return Err("need at least two products for the demo".into());
    };

    let store = Arc::new(InMemoryDocumentStore::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let state = AppState::builder(store.clone(), identity)
        .config(config)
        .build()?;

    let session = SessionService::new(&state);
    let cart = CartService::new(&state);
    let favorites = FavoritesService::new(&state);
    let notifications = NotificationService::new(&state);
    let orders = OrderService::new(&state);

    let password = SecretString::from("demo-password-42");
    let profile = session
        .register(RegisterRequest {
            name: "Demo Shopper".to_string(),
            user_name: "demo".to_string(),
            email: DEMO_EMAIL.to_string(),
            password: password.clone(),
        })
        .await?;
    info!(uid = %profile.uid, "Registered demo shopper");

    cart.increase_quantity(first).await?;
    cart.increase_quantity(first).await?;
    cart.increase_quantity(second).await?;
    cart.decrease_quantity(second.id).await?;
    cart.increase_quantity(second).await?;
    info!(items = cart.item_count(), "Cart filled");

    favorites.toggle_favorite(first).await?;
    info!(favorites = favorites.favorites().len(), "Favorite added");

    let preview = cart.totals(DeliveryTier::Express, None);
    info!(subtotal = %preview.subtotal, grand_total = %preview.grand_total, "Cart priced");

    let receipt = orders
        .checkout(CheckoutRequest {
            tier: DeliveryTier::Express,
            promo_code: Some("WELCOME20".to_string()),
        })
        .await?;
    info!(
        order_id = %receipt.order.order_id,
        total = %receipt.order.total,
        discount = %receipt.totals.discount,
        "Checked out"
    );

    for notification in notifications.entries() {
        info!(
            title = %notification.title,
            when = %notifications.time_ago(&notification),
            "Notification"
        );
    }
    if let Some(latest) = notifications.entries().last() {
        notifications.mark_as_read(latest.id).await?;
    }
    info!(unread = notifications.unread_count(), "Inbox");

    session.logout().await?;
    info!(logged_in = state.snapshot().is_logged_in(), "Logged out");

    session.login(DEMO_EMAIL, &password).await?;
    session.sync_user_data().await?;

    let snapshot = state.snapshot();
    info!(
        orders = orders.orders(None).len(),
        favorites = snapshot.favorites.len(),
        cart_items = snapshot.cart.item_count(),
        notifications = snapshot.notifications.len(),
        remote_writes = store.write_count(),
        "Logged back in"
    );

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Placed {} for {} ({} items)",
            receipt.order.order_id,
            receipt.order.total,
            receipt.totals.item_count
        );
    }

    Ok(())
}
