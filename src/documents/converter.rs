use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::documents::error::{data_loss, invalid_argument, DocumentResult};
use crate::documents::snapshot::{DocumentData, DocumentSnapshot};

/// Describes how a model type is written to and read from stored documents.
///
/// Writes use `to_data`; reads use `from_snapshot`, which also receives the
/// document id so models can carry the store-assigned identifier.
pub trait DocumentConverter: Send + Sync + Clone + 'static {
    type Model: Clone;

    fn to_data(&self, value: &Self::Model) -> DocumentResult<DocumentData>;

    fn from_snapshot(&self, snapshot: &DocumentSnapshot) -> DocumentResult<Self::Model>;
}

/// Serializes `value` into document fields. The value must serialize to a JSON object.
pub fn encode_fields<T>(value: &T) -> DocumentResult<DocumentData>
where
    T: Serialize,
{
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid_argument(format!(
            "Documents must be objects, got {}",
            json_kind(&other)
        ))),
        Err(err) => Err(invalid_argument(format!("Failed to encode document: {err}"))),
    }
}

/// Deserializes the fields of an existing document.
///
/// # Errors
/// Returns `documents/data-loss` when the snapshot has no data or the fields do
/// not match `T`.
pub fn decode_fields<T>(snapshot: &DocumentSnapshot) -> DocumentResult<T>
where
    T: DeserializeOwned,
{
    let data = snapshot
        .data()
        .ok_or_else(|| data_loss(format!("Document {} has no data", snapshot.key())))?;
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|err| data_loss(format!("Failed to decode document {}: {err}", snapshot.key())))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
