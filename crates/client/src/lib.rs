//! Shopmate client library.
//!
//! Holds the shopper's view state (session, favorites, cart, notifications,
//! orders, theme) and mirrors every change to a remote document store by
//! full-collection overwrite.
//!
//! # Architecture
//!
//! - [`state::AppState`] - cheaply cloneable handle to the state container
//!   and the injected collaborators
//! - [`remote::DocumentStore`] - remote tree store addressed by `users/{uid}/...`
//! - [`identity::IdentityProvider`] - sign-up, sign-in, sign-out
//! - [`services`] - session gate and the collection reducers
//! - [`catalog::CatalogClient`] - cached product catalog reads
//! - [`session_cache::SessionCache`] - encrypted on-disk session snapshot
//!
//! # Example
//!
//! ```rust,ignore
//! use shopmate_client::services::{CartService, SessionService};
//!
//! let state = AppState::builder(store, identity).build()?;
//! SessionService::new(&state).login("asha@example.com", &password).await?;
//! CartService::new(&state).increase_quantity(&product).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod remote;
pub mod services;
pub mod session_cache;
pub mod state;
pub mod sync;

pub use error::{ClientError, Result, UserMessage};
pub use state::{AppState, SessionStatus, StoreState};
