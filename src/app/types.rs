use serde::Deserialize;

use crate::app::constants::{
    DEFAULT_CART_COLLECTION, DEFAULT_ORDERS_COLLECTION, DEFAULT_PRODUCTS_COLLECTION,
};
use crate::app::errors::{invalid_options, AppResult};
use crate::documents::validate_collection_id;
use crate::logger::LogLevel;
use crate::orders::{CartLookup, OrderPagerConfig, DEFAULT_ORDER_PAGE_SIZE};

/// Configuration of a [`Dashboard`](crate::app::Dashboard).
///
/// Deserializes from camelCase JSON; every field but `projectId` and
/// `storageBucket` has a default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardOptions {
    pub project_id: String,
    pub storage_bucket: String,
    pub products_collection: String,
    pub orders_collection: String,
    pub cart_collection: String,
    pub order_page_size: u32,
    pub cart_lookup: CartLookup,
    /// Folder prepended to uploaded image names, empty for the bucket root.
    pub image_prefix: String,
    pub log_level: Option<LogLevel>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            storage_bucket: String::new(),
            products_collection: DEFAULT_PRODUCTS_COLLECTION.to_string(),
            orders_collection: DEFAULT_ORDERS_COLLECTION.to_string(),
            cart_collection: DEFAULT_CART_COLLECTION.to_string(),
            order_page_size: DEFAULT_ORDER_PAGE_SIZE,
            cart_lookup: CartLookup::Sequential,
            image_prefix: String::new(),
            log_level: None,
        }
    }
}

impl DashboardOptions {
    pub fn new(project_id: impl Into<String>, storage_bucket: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            storage_bucket: storage_bucket.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|err| invalid_options(err.to_string()))
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(invalid_options("projectId must not be empty"));
        }
        if self.storage_bucket.trim().is_empty() {
            return Err(invalid_options("storageBucket must not be empty"));
        }
        for (field, collection) in [
            ("productsCollection", &self.products_collection),
            ("ordersCollection", &self.orders_collection),
            ("cartCollection", &self.cart_collection),
        ] {
            validate_collection_id(collection)
                .map_err(|err| invalid_options(format!("{field}: {}", err.message())))?;
        }
        if self.order_page_size == 0 {
            return Err(invalid_options("orderPageSize must be greater than zero"));
        }
        Ok(())
    }

    pub(crate) fn pager_config(&self) -> OrderPagerConfig {
        OrderPagerConfig {
            orders_collection: self.orders_collection.clone(),
            cart_collection: self.cart_collection.clone(),
            page_size: self.order_page_size,
            cart_lookup: self.cart_lookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_defaults() {
        let options = DashboardOptions::from_json_str(
            r#"{ "projectId": "shop", "storageBucket": "shop.appspot.com", "cartLookup": "concurrent", "logLevel": "warn" }"#,
        )
        .unwrap();
        assert_eq!(options.products_collection, "products");
        assert_eq!(options.orders_collection, "orders");
        assert_eq!(options.cart_collection, "cart");
        assert_eq!(options.order_page_size, 20);
        assert_eq!(options.cart_lookup, CartLookup::Concurrent);
        assert_eq!(options.image_prefix, "");
        assert_eq!(options.log_level, Some(LogLevel::Warn));
        options.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(DashboardOptions::default().validate().is_err());

        let mut options = DashboardOptions::new("shop", "bucket");
        options.order_page_size = 0;
        assert_eq!(
            options.validate().unwrap_err().code_str(),
            "app/invalid-options"
        );

        let mut options = DashboardOptions::new("shop", "bucket");
        options.cart_collection = "cart/items".into();
        assert!(options.validate().is_err());
    }

    #[test]
    fn malformed_json_is_invalid_options() {
        let err = DashboardOptions::from_json_str(r#"{ "orderPageSize": "many" }"#).unwrap_err();
        assert_eq!(err.code_str(), "app/invalid-options");
    }
}
