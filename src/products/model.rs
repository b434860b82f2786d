use serde::{Deserialize, Serialize};

use crate::documents::fields::{lenient_f64, lenient_i64};
use crate::documents::{
    decode_fields, encode_fields, DocumentConverter, DocumentData, DocumentResult,
    DocumentSnapshot,
};

/// Quantity written on every product; stock is tracked by `remaining`.
pub const DEFAULT_QUANTITY: i64 = 1;

/// A catalog entry. `id` is assigned by the store and never written as a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub remaining: i64,
    #[serde(default)]
    pub image: String,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        cost: f64,
        description: impl Into<String>,
        remaining: i64,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            cost,
            description: description.into(),
            quantity: DEFAULT_QUANTITY,
            remaining,
            image: image.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

fn default_quantity() -> i64 {
    DEFAULT_QUANTITY
}

/// Converts [`Product`] values to and from stored documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProductConverter;

impl DocumentConverter for ProductConverter {
    type Model = Product;

    fn to_data(&self, value: &Product) -> DocumentResult<DocumentData> {
        encode_fields(value)
    }

    fn from_snapshot(&self, snapshot: &DocumentSnapshot) -> DocumentResult<Product> {
        let product: Product = decode_fields(snapshot)?;
        Ok(product.with_id(snapshot.id()))
    }
}
