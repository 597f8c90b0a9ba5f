//! Card collection inventory for Magic: The Gathering.
//!
//! Browses set catalogs served by a card-data backend, keeps a personal
//! collection keyed by card printing and finish, aggregates retail and
//! buylist prices across providers, and moves the collection in and out of
//! CSV files.
//!
//! # Quick start
//!
//! ```no_run
//! use mtg_inventory::{ApiClient, Inventory};
//! use mtg_inventory::view::SortField;
//!
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:3000")
//!     .build()
//!     .unwrap();
//! let mut inventory = Inventory::new(client);
//!
//! // Load two sets and show the first page sorted by price
//! inventory.select_sets(vec!["MH3".into(), "OTJ".into()]);
//! inventory.catalog_view.toggle_sort(SortField::Price);
//! let page = inventory.catalog_page();
//!
//! // Add the first card shown
//! if let Some(card) = page.items.first().map(|c| (*c).clone()) {
//!     inventory.add_from_catalog(&card, 1);
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod client;
pub mod collection;
pub mod config;
pub mod csv_codec;
pub mod error;
pub mod file_store;
pub mod identity;
pub mod inventory;
pub mod models;
pub mod pricing;
pub mod status;
pub mod view;

#[cfg(feature = "async")]
pub use async_client::AsyncApiClient;
pub use client::{ApiClient, ConnectionStatus};
pub use collection::{Collection, CollectionEntry};
pub use error::{InventoryError, Result};
pub use file_store::FileStore;
pub use identity::{CardIdentity, Finish};
pub use inventory::{Inventory, Notice};
pub use models::Card;
