//! Dashboard entry point: options, error mapping and the [`Dashboard`] facade.

mod api;
mod constants;
mod errors;
mod logger;
mod types;

#[doc(inline)]
pub use api::{initialize_dashboard, Dashboard, LIBRARY_VERSION};

#[doc(inline)]
pub use constants::{DEFAULT_CART_COLLECTION, DEFAULT_ORDERS_COLLECTION, DEFAULT_PRODUCTS_COLLECTION};

#[doc(inline)]
pub use errors::{AppError, AppResult, DashboardError, DashboardResult};

#[doc(inline)]
pub use types::DashboardOptions;
