//! Core types for the Brume cart.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;

pub use cart::{Cart, CartItem};
pub use catalog::{Catalog, Product};
pub use id::{VariantKey, VariantKeyError};
pub use price::{Price, format_amount};
