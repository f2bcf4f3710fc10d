//! Brume storefront cart.
//!
//! An in-page cart persisted in per-origin key-value storage, with a
//! slide-out drawer and a header badge that stay in sync with it, including
//! across tabs of the same origin.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use brume_storefront::config::CartConfig;
//! use brume_storefront::page::{CartPage, PageServices};
//! use brume_storefront::scheduler::ManualScheduler;
//! use brume_storefront::storage;
//! use brume_storefront::surface::MemorySurface;
//!
//! let config = CartConfig::from_env()?;
//! let services = PageServices::new(
//!     storage::from_config(&config),
//!     Arc::new(MemorySurface::new()),
//!     Arc::new(ManualScheduler::new()),
//! );
//! let page = CartPage::mount(config, services)?;
//! page.click("add-to-cart", None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod page;
pub mod scheduler;
pub mod storage;
pub mod surface;
pub mod telemetry;
