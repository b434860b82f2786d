//! Readers for fields whose stored type varies between records.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::documents::snapshot::DocumentData;

fn number_from(value: Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| "number out of range".to_string()),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("'{text}' is not a number")),
        other => Err(format!("expected a number, got {other}")),
    }
}

fn integer_from(value: Value) -> Result<Option<i64>, String> {
    match value {
        Value::Number(number) if number.is_i64() => Ok(number.as_i64()),
        Value::String(text) if text.trim().parse::<i64>().is_ok() => {
            Ok(text.trim().parse().ok())
        }
        other => number_from(other).map(|value| value.map(|value| value.trunc() as i64)),
    }
}

/// Removes `name` from `data` when `read` understands its value and returns it.
///
/// Unreadable values stay in `data` untouched, so the raw field survives in a
/// model's catch-all map. Null is consumed as `None`.
pub(crate) fn take_field<T>(
    data: &mut DocumentData,
    name: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = data.get(name)?;
    if value.is_null() {
        data.remove(name);
        return None;
    }
    let parsed = read(value)?;
    data.remove(name);
    Some(parsed)
}

pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn string_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

pub(crate) fn number_value(value: &Value) -> Option<f64> {
    number_from(value.clone()).ok().flatten()
}

pub(crate) fn integer_value(value: &Value) -> Option<i64> {
    integer_from(value.clone()).ok().flatten()
}

/// Number, numeric string or null (read as zero).
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    number_from(Value::deserialize(deserializer)?)
        .map(Option::unwrap_or_default)
        .map_err(de::Error::custom)
}

/// Integer, numeric string or null (read as zero). Fractions are truncated.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    integer_from(Value::deserialize(deserializer)?)
        .map(Option::unwrap_or_default)
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_f64")]
        total: f64,
        #[serde(default, deserialize_with = "lenient_i64")]
        count: i64,
    }

    #[test]
    fn accepts_mixed_representations() {
        let sample: Sample =
            serde_json::from_value(json!({ "total": "12.5", "count": 3.9 })).unwrap();
        assert_eq!(sample.total, 12.5);
        assert_eq!(sample.count, 3);

        let empty: Sample = serde_json::from_value(json!({ "count": " 7 " })).unwrap();
        assert_eq!(empty.total, 0.0);
        assert_eq!(empty.count, 7);
    }

    #[test]
    fn unreadable_fields_stay_in_place() {
        let Value::Object(mut data) = json!({
            "total": "Ksh 1,500",
            "count": "4",
            "code": null,
            "email": 42
        }) else {
            unreachable!()
        };

        assert_eq!(take_field(&mut data, "total", number_value), None);
        assert_eq!(take_field(&mut data, "count", integer_value), Some(4));
        assert_eq!(take_field(&mut data, "code", text_value), None);
        assert_eq!(take_field(&mut data, "email", string_value), None);
        assert_eq!(take_field(&mut data, "absent", text_value), None);

        assert_eq!(data.get("total"), Some(&json!("Ksh 1,500")));
        assert_eq!(data.get("email"), Some(&json!(42)));
        assert!(!data.contains_key("count"));
        assert!(!data.contains_key("code"));
    }

    #[test]
    fn rejects_non_numeric_text() {
        let result = serde_json::from_value::<Sample>(json!({ "total": "lots" }));
        assert!(result.is_err());
    }
}
