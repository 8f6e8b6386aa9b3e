//! Integration tests for the `PostgreSQL` document store.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `SHOPMATE_DATABASE_URL` (or `DATABASE_URL`) pointing at it
//! - Migrations applied (`shopmate migrate`)
//!
//! Run with: cargo test -p shopmate-integration-tests --features postgres -- --include-ignored

#![cfg(feature = "postgres")]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Value, json};
use shopmate_client::AppState;
use shopmate_client::identity::InMemoryIdentityProvider;
use shopmate_client::remote::{DocumentPath, DocumentStore, PgDocumentStore, StoreError, field};
use shopmate_client::services::{CartService, RegisterRequest, SessionService};
use shopmate_core::UserId;
use shopmate_integration_tests::{password, product, test_config};
use uuid::Uuid;

async fn connect() -> PgDocumentStore {
    let url = std::env::var("SHOPMATE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("SHOPMATE_DATABASE_URL not set");
    PgDocumentStore::connect(&SecretString::from(url))
        .await
        .expect("Failed to connect to database")
}

fn test_uid() -> UserId {
    UserId::new(format!("test-{}", Uuid::new_v4().simple()))
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_root_and_field_round_trip() {
    let store = connect().await;
    let uid = test_uid();
    let root = DocumentPath::user(&uid);

    store
        .set(&root, json!({ "uid": uid.as_str(), "cart": [] }))
        .await
        .unwrap();
    store
        .set(&DocumentPath::user_field(&uid, field::PHOTO_URL), json!("p.png"))
        .await
        .unwrap();

    let doc = store.get(&root).await.unwrap().unwrap();
    assert_eq!(doc["photoURL"], json!("p.png"));
    assert_eq!(doc["cart"], json!([]));

    store.set(&root, Value::Null).await.unwrap();
    assert!(store.get(&root).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_deep_paths_are_rejected() {
    let store = connect().await;
    let path = DocumentPath::user_field(&test_uid(), field::ORDERS).child("ORD-1");

    let err = store.set(&path, json!({})).await.unwrap_err();

    assert!(matches!(err, StoreError::UnsupportedPath(_)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_services_over_postgres() {
    let store = Arc::new(connect().await);
    let state = AppState::builder(store.clone(), Arc::new(InMemoryIdentityProvider::new()))
        .config(test_config())
        .build()
        .unwrap();
    let email = format!("{}@example.com", Uuid::new_v4().simple());

    let profile = SessionService::new(&state)
        .register(RegisterRequest {
            name: "Pg".to_string(),
            user_name: "pg".to_string(),
            email: email.clone(),
            password: password(),
        })
        .await
        .unwrap();
    CartService::new(&state)
        .increase_quantity(&product(1, 10))
        .await
        .unwrap();

    SessionService::new(&state).logout().await.unwrap();
    SessionService::new(&state)
        .login(&email, &password())
        .await
        .unwrap();
    assert_eq!(state.snapshot().cart.item_count(), 1);

    store
        .set(&DocumentPath::user(&profile.uid), Value::Null)
        .await
        .unwrap();
}
