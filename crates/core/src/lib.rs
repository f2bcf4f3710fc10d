//! Brume Core - Shared cart types.
//!
//! This crate provides the value types shared by the storefront cart and
//! its tests:
//! - `storefront` - Cart store, storage backends and the drawer/badge views
//! - `integration-tests` - Multi-tab and full-page scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no storage, no
//! rendering, no event plumbing. Cart arithmetic (add, set quantity, totals)
//! lives here so it can be tested without any collaborators.
//!
//! # Modules
//!
//! - [`types`] - Variant keys, prices, the catalog, cart lines and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
