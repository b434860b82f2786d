use serde::Serialize;

use crate::documents::error::data_loss;
use crate::documents::fields::{
    integer_value, number_value, string_value, take_field, text_value,
};
use crate::documents::{
    encode_fields, DocumentConverter, DocumentData, DocumentResult, DocumentSnapshot,
};

/// A placed order. `cart` is never stored; the pager rebuilds it on every fetch.
///
/// Typed fields are `None` when absent or unreadable. An unreadable value is
/// kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
    /// Postal address code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Payment reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpesa_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub cart: Vec<CartItem>,
    /// Stored fields without a dedicated attribute.
    #[serde(flatten)]
    pub extra: DocumentData,
}

impl Order {
    /// Email used to look the cart up, exactly as stored. `None` when absent or empty.
    pub fn cart_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }
}

/// One purchased line, matched to its order by `userEmail`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(flatten)]
    pub extra: DocumentData,
}

fn stored_fields(snapshot: &DocumentSnapshot) -> DocumentResult<DocumentData> {
    snapshot
        .data()
        .cloned()
        .ok_or_else(|| data_loss(format!("Document {} has no data", snapshot.key())))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OrderConverter;

impl DocumentConverter for OrderConverter {
    type Model = Order;

    fn to_data(&self, value: &Order) -> DocumentResult<DocumentData> {
        encode_fields(value)
    }

    fn from_snapshot(&self, snapshot: &DocumentSnapshot) -> DocumentResult<Order> {
        let mut data = stored_fields(snapshot)?;
        Ok(Order {
            id: snapshot.id().to_string(),
            order_no: take_field(&mut data, "orderNo", text_value),
            grand_total: take_field(&mut data, "grandTotal", number_value),
            code: take_field(&mut data, "code", text_value),
            phone: take_field(&mut data, "phone", text_value),
            mpesa_code: take_field(&mut data, "mpesaCode", text_value),
            email: take_field(&mut data, "email", string_value),
            cart: Vec::new(),
            extra: data,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CartItemConverter;

impl DocumentConverter for CartItemConverter {
    type Model = CartItem;

    fn to_data(&self, value: &CartItem) -> DocumentResult<DocumentData> {
        encode_fields(value)
    }

    fn from_snapshot(&self, snapshot: &DocumentSnapshot) -> DocumentResult<CartItem> {
        let mut data = stored_fields(snapshot)?;
        Ok(CartItem {
            id: snapshot.id().to_string(),
            name: take_field(&mut data, "name", text_value),
            quantity: take_field(&mut data, "quantity", integer_value),
            user_email: take_field(&mut data, "userEmail", text_value),
            extra: data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentKey;
    use serde_json::{json, Value};

    fn snapshot(collection: &str, id: &str, value: Value) -> DocumentSnapshot {
        let Value::Object(data) = value else {
            panic!("expected object");
        };
        DocumentSnapshot::new(DocumentKey::new(collection, id).unwrap(), data, 1)
    }

    #[test]
    fn order_reads_mixed_field_types() {
        let doc = snapshot(
            "orders",
            "o1",
            json!({
                "orderNo": 1042,
                "grandTotal": "1500.50",
                "code": "00100",
                "phone": 254712345678u64,
                "mpesaCode": "QK12AB",
                "email": "a@x.com",
                "status": "paid"
            }),
        );
        let order = OrderConverter.from_snapshot(&doc).unwrap();
        assert_eq!(order.id, "o1");
        assert_eq!(order.order_no.as_deref(), Some("1042"));
        assert_eq!(order.grand_total, Some(1500.5));
        assert_eq!(order.phone.as_deref(), Some("254712345678"));
        assert_eq!(order.cart_email(), Some("a@x.com"));
        assert_eq!(order.extra.get("status"), Some(&json!("paid")));
        assert!(order.cart.is_empty());
    }

    #[test]
    fn cart_is_not_written() {
        let mut order = Order {
            email: Some("a@x.com".into()),
            ..Order::default()
        };
        order.cart.push(CartItem::default());
        let data = OrderConverter.to_data(&order).unwrap();
        assert!(!data.contains_key("cart"));
        assert_eq!(data.get("email"), Some(&json!("a@x.com")));
    }

    #[test]
    fn cart_item_keeps_unknown_fields() {
        let doc = snapshot(
            "cart",
            "c7",
            json!({ "name": "Tea", "quantity": 2, "userEmail": "a@x.com", "price": 3.5 }),
        );
        let item = CartItemConverter.from_snapshot(&doc).unwrap();
        assert_eq!(item.id, "c7");
        assert_eq!(item.quantity, Some(2));
        assert_eq!(item.user_email.as_deref(), Some("a@x.com"));
        assert_eq!(item.extra.get("price"), Some(&json!(3.5)));
    }

    #[test]
    fn cart_email_is_used_as_stored() {
        let empty = Order {
            email: Some(String::new()),
            ..Order::default()
        };
        assert_eq!(empty.cart_email(), None);

        let padded = Order {
            email: Some("a@x.com ".into()),
            ..Order::default()
        };
        assert_eq!(padded.cart_email(), Some("a@x.com "));
    }

    #[test]
    fn unreadable_order_fields_fall_back_to_extra() {
        let doc = snapshot(
            "orders",
            "o2",
            json!({ "grandTotal": "Ksh 1,500", "email": 42, "phone": null, "code": "00100" }),
        );
        let order = OrderConverter.from_snapshot(&doc).unwrap();
        assert_eq!(order.id, "o2");
        assert_eq!(order.grand_total, None);
        assert_eq!(order.email, None);
        assert_eq!(order.phone, None);
        assert_eq!(order.code.as_deref(), Some("00100"));
        assert_eq!(order.extra.get("grandTotal"), Some(&json!("Ksh 1,500")));
        assert_eq!(order.extra.get("email"), Some(&json!(42)));

        let data = OrderConverter.to_data(&order).unwrap();
        assert_eq!(data.get("grandTotal"), Some(&json!("Ksh 1,500")));
    }

    #[test]
    fn unreadable_cart_fields_fall_back_to_extra() {
        let doc = snapshot(
            "cart",
            "c8",
            json!({ "name": 7, "quantity": "2 pcs", "userEmail": "a@x.com" }),
        );
        let item = CartItemConverter.from_snapshot(&doc).unwrap();
        assert_eq!(item.name.as_deref(), Some("7"));
        assert_eq!(item.quantity, None);
        assert_eq!(item.extra.get("quantity"), Some(&json!("2 pcs")));
    }
}
