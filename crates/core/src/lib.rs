//! Shopmate Core - Shared domain types.
//!
//! This crate provides the types and pure state transitions used by every
//! Shopmate component:
//! - `client` - State container, session gate and collection services
//! - `cli` - Command-line tools for browsing, quoting and migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no remote
//! store access, no HTTP clients. Every reducer here takes a collection and
//! returns the outcome; persisting the result is the client's job.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`models`] - Products, cart lines, favorites, notifications, orders, users
//! - [`pricing`] - Cart totals, tax and delivery policy, promo codes
//! - [`time`] - Relative "time ago" wording

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod pricing;
pub mod time;
pub mod types;

pub use models::*;
pub use pricing::{CartTotals, DeliveryFees, PricingError, PricingPolicy, PromoCode};
pub use types::*;
