//! Admin dashboard core for a storefront.
//!
//! The crate keeps a live catalog of products, pages through orders with their
//! carts attached, uploads product images and drives the add/edit product form.
//! Persistence goes through two collaborators:
//!
//! - [`documents::DocumentStore`], a document database with live queries;
//! - [`storage::BlobStore`], an object store serving public download URLs.
//!
//! Both ship with in-memory implementations. [`app::initialize_dashboard`]
//! wires everything together:
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront_admin::app::{initialize_dashboard, DashboardOptions};
//! use storefront_admin::documents::InMemoryDocumentStore;
//! use storefront_admin::storage::InMemoryBlobStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = DashboardOptions::from_json_str(
//!     r#"{ "projectId": "shop", "storageBucket": "shop.appspot.com" }"#,
//! )?;
//! let dashboard = initialize_dashboard(
//!     options,
//!     Arc::new(InMemoryDocumentStore::new()),
//!     Arc::new(InMemoryBlobStore::new()),
//! )?;
//! dashboard.mount().await?;
//! for order in dashboard.orders() {
//!     println!("{:?}: {} items", order.order_no, order.cart.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod documents;
pub mod logger;
pub mod orders;
pub mod products;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
