use serde_json::Value;

use crate::documents::error::{invalid_argument, DocumentResult};
use crate::documents::key::validate_collection_id;
use crate::documents::snapshot::DocumentCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    field: String,
    operator: FilterOperator,
    value: Value,
}

impl FieldFilter {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A query over one collection, evaluated in the store's default order.
///
/// There is no `order_by`: results always come back in creation order, which is
/// also the order cursors are expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    collection: String,
    filters: Vec<FieldFilter>,
    start_after: Option<DocumentCursor>,
    limit: Option<u32>,
}

impl Query {
    /// Starts a query that matches every document of `collection`.
    pub fn collection(collection: impl Into<String>) -> DocumentResult<Self> {
        let collection = collection.into();
        validate_collection_id(&collection)?;
        Ok(Self {
            collection,
            filters: Vec::new(),
            start_after: None,
            limit: None,
        })
    }

    /// Adds a field filter; all filters must match.
    ///
    /// # Errors
    /// Returns `documents/invalid-argument` for an empty field name.
    pub fn where_field(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: Value,
    ) -> DocumentResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(invalid_argument("Filter field names must not be empty"));
        }
        self.filters.push(FieldFilter {
            field,
            operator,
            value,
        });
        Ok(self)
    }

    /// Only return documents positioned after `cursor`.
    pub fn start_after(mut self, cursor: DocumentCursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: u32) -> DocumentResult<Self> {
        if limit == 0 {
            return Err(invalid_argument("Query limit must be greater than zero"));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn collection_id(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn start_after_cursor(&self) -> Option<&DocumentCursor> {
        self.start_after.as_ref()
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_filtered_page_query() {
        let query = Query::collection("orders")
            .unwrap()
            .where_field("userEmail", FilterOperator::Equal, json!("a@x.com"))
            .unwrap()
            .start_after(DocumentCursor::new(20, "o20"))
            .limit(20)
            .unwrap();
        assert_eq!(query.collection_id(), "orders");
        assert_eq!(query.filters().len(), 1);
        assert_eq!(query.filters()[0].field(), "userEmail");
        assert_eq!(query.start_after_cursor().map(|c| c.sequence()), Some(20));
        assert_eq!(query.limit_value(), Some(20));
    }

    #[test]
    fn rejects_invalid_constraints() {
        let query = Query::collection("orders").unwrap();
        assert!(query.clone().limit(0).is_err());
        assert!(query
            .where_field(" ", FilterOperator::Equal, json!(1))
            .is_err());
        assert!(Query::collection("a/b").is_err());
    }
}
