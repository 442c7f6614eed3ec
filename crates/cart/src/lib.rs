//! RocketShoes Cart - client-side shopping cart store.
//!
//! Holds the list of products a shopper has picked, validates every quantity
//! change against the remote stock service, and persists each successful
//! change to local storage so the cart survives restarts.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the cart and is the only thing that changes it
//! - Collaborators are injected as trait objects: [`StockService`],
//!   [`ProductCatalog`], [`CartStorage`] and [`Notifier`]
//! - [`ApiClient`] implements both lookups over HTTP with `reqwest`, caching
//!   product metadata with `moka` (stock is never cached)
//! - Operations are serialized and return a [`CartOutcome`]; failures are
//!   reported to the shopper through the notifier, never as panics
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocketshoes_cart::{ApiClient, CartConfig, CartStore, ChannelNotifier, FileStorage};
//!
//! let config = CartConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config)?);
//! let (notifier, mut notices) = ChannelNotifier::channel();
//! let store = CartStore::initialize(
//!     api.clone(),
//!     api,
//!     Arc::new(FileStorage::new(&config.storage_dir)),
//!     Arc::new(notifier),
//! )?;
//!
//! store.add_product(ProductId::new(1)).await;
//! while let Ok(notice) = notices.try_recv() {
//!     eprintln!("{notice}");
//! }
//! println!("{} items", store.cart().total_quantity());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod storage;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use config::{CartConfig, ConfigError};
pub use error::CartError;
pub use notify::{ChannelNotifier, Notification, Notifier};
pub use services::{ProductCatalog, StockService};
pub use storage::{CART_STORAGE_KEY, CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartOutcome, CartStore, Rejection};

pub use rocketshoes_core::{CartState, LineItem, Product, ProductId, StockRecord};
