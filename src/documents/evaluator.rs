use serde_json::Value;

use crate::documents::query::{FieldFilter, FilterOperator, Query};
use crate::documents::snapshot::DocumentSnapshot;

/// Applies `query` to candidate documents of its collection and returns the
/// filtered result in store order, honouring the cursor and limit.
pub(crate) fn apply_query(mut documents: Vec<DocumentSnapshot>, query: &Query) -> Vec<DocumentSnapshot> {
    documents.retain(|snapshot| {
        snapshot.exists()
            && snapshot.key().collection() == query.collection_id()
            && document_satisfies_filters(snapshot, query.filters())
    });

    documents.sort_by_key(|snapshot| snapshot.cursor());

    if let Some(bound) = query.start_after_cursor() {
        documents.retain(|snapshot| match snapshot.cursor() {
            Some(cursor) => &cursor > bound,
            None => false,
        });
    }

    if let Some(limit) = query.limit_value() {
        documents.truncate(limit as usize);
    }

    documents
}

fn document_satisfies_filters(snapshot: &DocumentSnapshot, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|filter| match snapshot.get(filter.field()) {
        Some(value) => evaluate_filter(filter, value),
        None => false,
    })
}

fn evaluate_filter(filter: &FieldFilter, value: &Value) -> bool {
    match filter.operator() {
        FilterOperator::Equal => values_equal(value, filter.value()),
    }
}

/// Numbers compare by value so `3` matches `3.0`, as in the hosted store.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::key::DocumentKey;
    use crate::documents::snapshot::{DocumentCursor, DocumentData};
    use serde_json::json;

    fn doc(collection: &str, id: &str, sequence: u64, value: Value) -> DocumentSnapshot {
        let data: DocumentData = match value {
            Value::Object(map) => map,
            _ => unreachable!("test data must be an object"),
        };
        DocumentSnapshot::new(DocumentKey::new(collection, id).unwrap(), data, sequence)
    }

    #[test]
    fn filters_by_equality_and_keeps_store_order() {
        let documents = vec![
            doc("cart", "c3", 3, json!({"userEmail": "a@x.com"})),
            doc("cart", "c1", 1, json!({"userEmail": "a@x.com"})),
            doc("cart", "c2", 2, json!({"userEmail": "b@x.com"})),
            doc("orders", "o1", 4, json!({"userEmail": "a@x.com"})),
        ];
        let query = Query::collection("cart")
            .unwrap()
            .where_field("userEmail", FilterOperator::Equal, json!("a@x.com"))
            .unwrap();

        let ids: Vec<_> = apply_query(documents, &query)
            .iter()
            .map(|snapshot| snapshot.id().to_owned())
            .collect();
        assert_eq!(ids, ["c1", "c3"]);
    }

    #[test]
    fn applies_cursor_then_limit() {
        let documents = (1..=5)
            .map(|n| doc("orders", &format!("o{n}"), n, json!({"orderNo": n})))
            .collect();
        let query = Query::collection("orders")
            .unwrap()
            .start_after(DocumentCursor::new(2, "o2"))
            .limit(2)
            .unwrap();

        let ids: Vec<_> = apply_query(documents, &query)
            .iter()
            .map(|snapshot| snapshot.id().to_owned())
            .collect();
        assert_eq!(ids, ["o3", "o4"]);
    }

    #[test]
    fn equality_matches_integer_and_double() {
        let documents = vec![
            doc("products", "p1", 1, json!({"remaining": 2})),
            doc("products", "p2", 2, json!({"remaining": 2.0})),
            doc("products", "p3", 3, json!({"remaining": "2"})),
            doc("products", "p4", 4, json!({"name": "no stock field"})),
        ];
        let query = Query::collection("products")
            .unwrap()
            .where_field("remaining", FilterOperator::Equal, json!(2))
            .unwrap();

        let ids: Vec<_> = apply_query(documents, &query)
            .iter()
            .map(|snapshot| snapshot.id().to_owned())
            .collect();
        assert_eq!(ids, ["p1", "p2"]);
    }
}
